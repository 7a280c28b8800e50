//! Choice field format: an exact, case-sensitive match against a fixed list
//! of literal or quoted atoms.

use super::{FieldFormatHeader, FieldValue};
use crate::error::{CutplaceError, Location};

fn parse_choices(rule: &str) -> crate::error::Result<Vec<String>> {
    let mut choices = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let chars: Vec<char> = rule.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        let character = chars[index];
        match quote {
            Some(q) if character == q => {
                quote = None;
                index += 1;
            }
            Some(_) => {
                current.push(character);
                index += 1;
            }
            None => {
                if character == '\'' || character == '"' {
                    quote = Some(character);
                    index += 1;
                } else if character == ',' {
                    choices.push(current.trim().to_string());
                    current = String::new();
                    index += 1;
                } else {
                    current.push(character);
                    index += 1;
                }
            }
        }
    }
    if quote.is_some() {
        return Err(CutplaceError::interface(format!(
            "choice rule {:?} has an unterminated quoted string",
            rule
        )));
    }
    choices.push(current.trim().to_string());

    if choices.iter().any(|choice| choice.is_empty()) {
        return Err(CutplaceError::interface(format!(
            "choice rule {:?} must not have empty, leading, trailing, or doubled commas",
            rule
        )));
    }
    if choices.is_empty() {
        return Err(CutplaceError::interface("choice rule must list at least one choice"));
    }
    Ok(choices)
}

#[derive(Clone, Debug)]
pub struct ChoiceFieldFormat {
    pub header: FieldFormatHeader,
    choices: Vec<String>,
}

impl ChoiceFieldFormat {
    pub fn new(header: FieldFormatHeader) -> crate::error::Result<Self> {
        let choices = parse_choices(&header.rule)?;
        Ok(ChoiceFieldFormat { header, choices })
    }

    pub fn validated_value(&self, text: &str, location: &Location) -> crate::error::Result<FieldValue> {
        if self.choices.iter().any(|choice| choice == text) {
            Ok(FieldValue::Choice(text.to_string()))
        } else {
            Err(CutplaceError::field_value(format!(
                "field {:?} is {:?} but must be one of: {}",
                self.header.name,
                text,
                self.choices.join(", ")
            ))
            .with_location(location.clone()))
        }
    }
}
