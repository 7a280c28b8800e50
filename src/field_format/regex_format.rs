//! RegEx field format: a user-supplied regular expression, compiled
//! case-insensitive and multi-line, matched from the start of the text.

use regex::{Regex, RegexBuilder};

use super::{FieldFormatHeader, FieldValue};
use crate::error::{CutplaceError, Location};

fn compile_anchored(rule: &str) -> crate::error::Result<Regex> {
    RegexBuilder::new(&format!("\\A(?:{})", rule))
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|error| CutplaceError::interface(format!("regular expression could not be compiled: {}", error)))
}

#[derive(Clone, Debug)]
pub struct RegExFieldFormat {
    pub header: FieldFormatHeader,
    regex: Regex,
}

impl RegExFieldFormat {
    pub fn new(header: FieldFormatHeader) -> crate::error::Result<Self> {
        let regex = compile_anchored(&header.rule)?;
        Ok(RegExFieldFormat { header, regex })
    }

    pub fn validated_value(&self, text: &str, location: &Location) -> crate::error::Result<FieldValue> {
        if self.regex.is_match(text) {
            Ok(FieldValue::RegEx(text.to_string()))
        } else {
            Err(CutplaceError::field_value(format!(
                "field {:?} is {:?} but must match regular expression: {:?}",
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
    fn matches_from_start() {
        let header = FieldFormatHeader::new("code", false, "", "[a-z]+[0-9]+").unwrap();
        let format = RegExFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("ab12", &location).is_ok());
        assert!(format.validated_value("12ab", &location).is_err());
    }

    #[test]
    fn invalid_regex_is_interface_error() {
        let header = FieldFormatHeader::new("code", false, "", "(unterminated").unwrap();
        assert!(RegExFieldFormat::new(header).is_err());
    }
}
