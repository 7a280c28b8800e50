//! Integer field format: a signed decimal integer within a bounded range.
//!
//! The valid range defaults to `-2^31…2^31-1`. If `length` is given and the
//! rule is empty, the range is instead derived from the field's character
//! length (e.g. length `3` ⇒ `-99…999`). When both are present for a
//! `fixed` field, the rule's digit widths must fit inside `length`.

use rust_decimal::Decimal;

use super::{FieldFormatHeader, FieldValue};
use crate::data_format::{DataFormat, DataFormatFamily};
use crate::error::{CutplaceError, Location};
use crate::range::Range;

const DEFAULT_LOWER: i64 = -(1i64 << 31);
const DEFAULT_UPPER: i64 = (1i64 << 31) - 1;

#[derive(Clone, Debug)]
pub struct IntegerFieldFormat {
    pub header: FieldFormatHeader,
    valid_range: Range,
}

fn digits_needed(value: i64) -> u32 {
    value.unsigned_abs().to_string().len() as u32
}

impl IntegerFieldFormat {
    pub fn new(header: FieldFormatHeader, data_format: &DataFormat) -> crate::error::Result<Self> {
        let exact_length = header
            .length
            .lower_limit()
            .zip(header.length.upper_limit())
            .filter(|(lower, upper)| lower == upper)
            .map(|(lower, _)| lower);

        let valid_range = if !header.rule.trim().is_empty() {
            let range = Range::parse(&header.rule)?;
            if let (Some(length), DataFormatFamily::Fixed) = (exact_length, data_format.family()) {
                let length_digits: u32 = length.to_string().parse::<i64>().unwrap_or(0).max(0) as u32;
                let needed = [range.lower_limit(), range.upper_limit()]
                    .into_iter()
                    .flatten()
                    .filter_map(|value| value.to_string().parse::<i64>().ok())
                    .map(digits_needed)
                    .max()
                    .unwrap_or(0);
                if needed > length_digits {
                    return Err(CutplaceError::interface(format!(
                        "integer rule {:?} needs {} digits but field length is only {}",
                        header.rule, needed, length_digits
                    )));
                }
            }
            range
        } else if let Some(length) = exact_length {
            let length: i64 = length.to_string().parse().map_err(|_| {
                CutplaceError::interface("field length must be an integer for a default integer range")
            })?;
            if length < 1 {
                return Err(CutplaceError::interface("field length must be at least 1"));
            }
            let upper = 10i64.pow(length as u32) - 1;
            let lower = -(10i64.pow((length - 1) as u32) - 1);
            Range::parse(&format!("{}...{}", lower, upper))?
        } else {
            Range::parse(&format!("{}...{}", DEFAULT_LOWER, DEFAULT_UPPER))?
        };

        Ok(IntegerFieldFormat { header, valid_range })
    }

    pub fn validated_value(&self, text: &str, location: &Location) -> crate::error::Result<FieldValue> {
        let value: i64 = text.trim().parse().map_err(|_| {
            CutplaceError::field_value(format!("field {:?} must be an integer but is: {:?}", self.header.name, text))
                .with_location(location.clone())
        })?;
        self.valid_range
            .validate(&format!("field {:?}", self.header.name), Decimal::from(value), location)
            .map_err(|error| CutplaceError::field_value(error.message).with_location(location.clone()))?;
        Ok(FieldValue::Integer(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(rule: &str, length: &str) -> IntegerFieldFormat {
        let header = FieldFormatHeader::new("amount", false, length, rule).unwrap();
        let data_format = DataFormat::new(DataFormatFamily::Delimited);
        IntegerFieldFormat::new(header, &data_format).unwrap()
    }

    #[test]
    fn default_range_is_i32_bounds() {
        let format = format("", "");
        let location = Location::new("test");
        assert!(format.validated_value("2147483647", &location).is_ok());
        assert!(format.validated_value("2147483648", &location).is_err());
    }

    #[test]
    fn rule_overrides_range() {
        let format = format("0...99", "");
        let location = Location::new("test");
        assert!(format.validated_value("99", &location).is_ok());
        assert!(format.validated_value("100", &location).is_err());
    }

    #[test]
    fn length_derives_default_range() {
        let format = format("", "3");
        let location = Location::new("test");
        assert!(format.validated_value("999", &location).is_ok());
        assert!(format.validated_value("-99", &location).is_ok());
        assert!(format.validated_value("1000", &location).is_err());
    }

    #[test]
    fn non_numeric_text_fails() {
        let format = format("", "");
        let location = Location::new("test");
        assert!(format.validated_value("abc", &location).is_err());
    }
}
