//! Pattern field format: a glob (`?` = one character, `*` = any sequence)
//! compiled to an anchored, case-insensitive, multi-line regular
//! expression.

use regex::{Regex, RegexBuilder};

use super::{FieldFormatHeader, FieldValue};
use crate::error::{CutplaceError, Location};

fn translate_glob(rule: &str) -> String {
    let mut translated = String::with_capacity(rule.len() * 2);
    for character in rule.chars() {
        match character {
            '?' => translated.push('.'),
            '*' => translated.push_str(".*"),
            _ => translated.push_str(&regex::escape(&character.to_string())),
        }
    }
    translated
}

/// Anchors at the absolute start of the text (`\A`, not `^`) so that
/// multi-line mode only affects any literal `^`/`$` the rule itself
/// contains, matching the "match", not "fullmatch", semantics used
/// throughout this family of field formats.
fn compile_anchored(translated: &str) -> crate::error::Result<Regex> {
    RegexBuilder::new(&format!("\\A(?:{})", translated))
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|error| CutplaceError::interface(format!("pattern could not be compiled: {}", error)))
}

#[derive(Clone, Debug)]
pub struct PatternFieldFormat {
    pub header: FieldFormatHeader,
    regex: Regex,
}

impl PatternFieldFormat {
    pub fn new(header: FieldFormatHeader) -> crate::error::Result<Self> {
        let translated = translate_glob(&header.rule);
        let regex = compile_anchored(&translated)?;
        Ok(PatternFieldFormat { header, regex })
    }

    pub fn validated_value(&self, text: &str, location: &Location) -> crate::error::Result<FieldValue> {
        if self.regex.is_match(text) {
            Ok(FieldValue::Pattern(text.to_string()))
        } else {
            Err(CutplaceError::field_value(format!(
                "field {:?} is {:?} but must match pattern: {:?}",
                self.header.name, text, self.header.rule
            ))
            .with_location(location.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_mark_matches_one_character() {
        let header = FieldFormatHeader::new("code", false, "", "a?c").unwrap();
        let format = PatternFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("abc", &location).is_ok());
        assert!(format.validated_value("ac", &location).is_err());
    }

    #[test]
    fn star_matches_any_sequence() {
        let header = FieldFormatHeader::new("code", false, "", "a*z").unwrap();
        let format = PatternFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("abcz", &location).is_ok());
    }

    #[test]
    fn match_is_case_insensitive() {
        let header = FieldFormatHeader::new("code", false, "", "ABC").unwrap();
        let format = PatternFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("abc", &location).is_ok());
    }

    #[test]
    fn match_is_prefix_anchored_only() {
        let header = FieldFormatHeader::new("code", false, "", "abc").unwrap();
        let format = PatternFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("abcdef", &location).is_ok());
    }
}
