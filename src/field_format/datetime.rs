//! DateTime field format: a human-readable pattern (`DD`, `MM`, `YYYY`,
//! `YY`, `hh`, `mm`, `ss`, `%` for a literal percent) compiled to a strict
//! parser.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{FieldFormatHeader, FieldValue};
use crate::error::{CutplaceError, Location};

/// Order matters: `%` must be escaped first, and `YYYY` must be replaced
/// before `YY` or the shorter token would consume half of the longer one.
const TOKEN_REPLACEMENTS: &[(&str, &str)] = &[
    ("%", "%%"),
    ("DD", "%d"),
    ("MM", "%m"),
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("hh", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

fn compile_pattern(rule: &str) -> crate::error::Result<String> {
    if rule.trim().is_empty() {
        return Err(CutplaceError::interface("DateTime field requires a non-empty rule"));
    }
    let mut compiled = rule.to_string();
    for (token, replacement) in TOKEN_REPLACEMENTS {
        compiled = compiled.replace(token, replacement);
    }
    Ok(compiled)
}

#[derive(Clone, Debug)]
pub struct DateTimeFieldFormat {
    pub header: FieldFormatHeader,
    pattern: String,
    has_date: bool,
    has_time: bool,
}

impl DateTimeFieldFormat {
    pub fn new(header: FieldFormatHeader) -> crate::error::Result<Self> {
        let pattern = compile_pattern(&header.rule)?;
        let has_date = ["%Y", "%y", "%d", "%m"].iter().any(|token| pattern.contains(token));
        let has_time = ["%H", "%M", "%S"].iter().any(|token| pattern.contains(token));
        if !has_date && !has_time {
            return Err(CutplaceError::interface(format!(
                "DateTime rule {:?} does not contain any recognized date or time token",
                header.rule
            )));
        }
        Ok(DateTimeFieldFormat {
            header,
            pattern,
            has_date,
            has_time,
        })
    }

    pub fn validated_value(&self, text: &str, location: &Location) -> crate::error::Result<FieldValue> {
        let parsed = if self.has_date && self.has_time {
            NaiveDateTime::parse_from_str(text, &self.pattern)
        } else if self.has_date {
            NaiveDate::parse_from_str(text, &self.pattern).map(|date| date.and_hms_opt(0, 0, 0).unwrap())
        } else {
            NaiveTime::parse_from_str(text, &self.pattern)
                .map(|time| NaiveDateTime::new(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(), time))
        };
        parsed
            .map(FieldValue::DateTime)
            .map_err(|_| {
                CutplaceError::field_value(format!(
                    "field {:?} must match date/time pattern {:?} but is: {:?}",
                    self.header.name, self.header.rule, text
                ))
                .with_location(location.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_date_time() {
        let header = FieldFormatHeader::new("created", false, "", "YYYY-MM-DD hh:mm:ss").unwrap();
        let format = DateTimeFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("2021-05-17 13:45:00", &location).is_ok());
        assert!(format.validated_value("not-a-date", &location).is_err());
    }

    #[test]
    fn parses_date_only() {
        let header = FieldFormatHeader::new("born", false, "", "DD.MM.YYYY").unwrap();
        let format = DateTimeFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("17.05.2021", &location).is_ok());
    }

    #[test]
    fn empty_rule_is_interface_error() {
        let header = FieldFormatHeader::new("created", false, "", "").unwrap();
        assert!(DateTimeFieldFormat::new(header).is_err());
    }
}
