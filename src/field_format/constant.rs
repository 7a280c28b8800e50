//! Constant field format: every non-empty cell must equal one fixed literal.

use super::{FieldFormatHeader, FieldValue};
use crate::error::CutplaceError;
use crate::error::Location;

fn literal_text(rule: &str) -> String {
    let trimmed = rule.trim();
    let mut chars = trimmed.chars();
    if let (Some(first), Some(last)) = (chars.next(), trimmed.chars().last()) {
        if (first == '\'' || first == '"') && first == last && trimmed.chars().count() >= 2 {
            return trimmed[first.len_utf8()..trimmed.len() - last.len_utf8()].to_string();
        }
    }
    trimmed.to_string()
}

#[derive(Clone, Debug)]
pub struct ConstantFieldFormat {
    pub header: FieldFormatHeader,
    literal: String,
}

impl ConstantFieldFormat {
    pub fn new(header: FieldFormatHeader) -> crate::error::Result<Self> {
        if header.is_allowed_to_be_empty && !header.rule.trim().is_empty() {
            return Err(CutplaceError::interface(
                "an empty-allowed Constant field must have an empty rule",
            ));
        }
        if !header.is_allowed_to_be_empty && header.rule.trim().is_empty() {
            return Err(CutplaceError::interface(
                "a Constant field that is not allowed to be empty must have a non-empty rule",
            ));
        }
        let literal = literal_text(&header.rule);
        Ok(ConstantFieldFormat { header, literal })
    }

    pub fn validated_value(&self, text: &str, location: &Location) -> crate::error::Result<FieldValue> {
        if text == self.literal {
            Ok(FieldValue::Constant(text.to_string()))
        } else {
            Err(CutplaceError::field_value(format!(
                "field {:?} is {:?} but must be the constant: {:?}",
                self.header.name, text, self.literal
            ))
            .with_location(location.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_plain_literal() {
        let header = FieldFormatHeader::new("kind", false, "", "invoice").unwrap();
        let format = ConstantFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("invoice", &location).is_ok());
        assert!(format.validated_value("receipt", &location).is_err());
    }

    #[test]
    fn matches_quoted_literal() {
        let header = FieldFormatHeader::new("kind", false, "", "\"in, voice\"").unwrap();
        let format = ConstantFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("in, voice", &location).is_ok());
    }

    #[test]
    fn empty_allowed_requires_empty_rule() {
        let header = FieldFormatHeader::new("kind", true, "", "invoice").unwrap();
        assert!(ConstantFieldFormat::new(header).is_err());
    }

    #[test]
    fn non_empty_allowed_requires_non_empty_rule() {
        let header = FieldFormatHeader::new("kind", false, "", "").unwrap();
        assert!(ConstantFieldFormat::new(header).is_err());
    }
}
