//! Decimal field format: exact fixed-point numbers using the data format's
//! configured decimal/thousands separators.
//!
//! With no rule, the default precision is 19 integer and 12 fractional
//! digits. A rule, if present, is a [`Range`] the parsed value must satisfy.

use rust_decimal::Decimal;

use super::{FieldFormatHeader, FieldValue};
use crate::data_format::DataFormat;
use crate::error::{CutplaceError, Location};
use crate::range::Range;

const DEFAULT_INTEGER_DIGITS: usize = 19;
const DEFAULT_FRACTIONAL_DIGITS: usize = 12;

#[derive(Clone, Debug)]
pub struct DecimalFieldFormat {
    pub header: FieldFormatHeader,
    valid_range: Option<Range>,
}

impl DecimalFieldFormat {
    pub fn new(header: FieldFormatHeader) -> crate::error::Result<Self> {
        let valid_range = if header.rule.trim().is_empty() {
            None
        } else {
            Some(Range::parse(&header.rule)?)
        };
        Ok(DecimalFieldFormat { header, valid_range })
    }

    /// Normalizes `text` to a plain `lower.upper` form: strips thousands
    /// separators before the decimal point, rejects a thousands separator
    /// after it, and rejects a doubled decimal separator.
    fn normalize(&self, text: &str, data_format: &DataFormat, location: &Location) -> crate::error::Result<String> {
        let decimal_separator = data_format.decimal_separator();
        let thousands_separator = data_format.thousands_separator();
        let mut normalized = String::with_capacity(text.len());
        let mut seen_decimal_separator = false;
        for character in text.chars() {
            if character == decimal_separator {
                if seen_decimal_separator {
                    return Err(CutplaceError::field_value(format!(
                        "field {:?} must not contain more than one decimal separator {:?} but is: {:?}",
                        self.header.name, decimal_separator, text
                    ))
                    .with_location(location.clone()));
                }
                seen_decimal_separator = true;
                normalized.push('.');
            } else if character == thousands_separator {
                if seen_decimal_separator {
                    return Err(CutplaceError::field_value(format!(
                        "field {:?} must not contain thousands separator {:?} after the decimal separator but is: {:?}",
                        self.header.name, thousands_separator, text
                    ))
                    .with_location(location.clone()));
                }
            } else {
                normalized.push(character);
            }
        }
        Ok(normalized)
    }

    pub fn validated_value(
        &self,
        text: &str,
        data_format: &DataFormat,
        location: &Location,
    ) -> crate::error::Result<FieldValue> {
        let normalized = self.normalize(text, data_format, location)?;
        let value: Decimal = normalized.parse().map_err(|_| {
            CutplaceError::field_value(format!("field {:?} must be a decimal number but is: {:?}", self.header.name, text))
                .with_location(location.clone())
        })?;

        match &self.valid_range {
            Some(range) => {
                range
                    .validate(&format!("field {:?}", self.header.name), value, location)
                    .map_err(|error| CutplaceError::field_value(error.message).with_location(location.clone()))?;
            }
            None => {
                let integer_digits = value.trunc().abs().to_string().len();
                let fractional_digits = value.scale() as usize;
                if integer_digits > DEFAULT_INTEGER_DIGITS || fractional_digits > DEFAULT_FRACTIONAL_DIGITS {
                    return Err(CutplaceError::field_value(format!(
                        "field {:?} must have at most {} integer and {} fractional digits but is: {:?}",
                        self.header.name, DEFAULT_INTEGER_DIGITS, DEFAULT_FRACTIONAL_DIGITS, text
                    ))
                    .with_location(location.clone()));
                }
            }
        }

        Ok(FieldValue::Decimal(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_format::DataFormatFamily;

    fn sealed_format() -> DataFormat {
        let mut data_format = DataFormat::new(DataFormatFamily::Delimited);
        data_format.validate().unwrap();
        data_format
    }

    #[test]
    fn parses_plain_decimal() {
        let header = FieldFormatHeader::new("price", false, "", "").unwrap();
        let format = DecimalFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        let value = format.validated_value("19.99", &sealed_format(), &location).unwrap();
        assert_eq!(value, FieldValue::Decimal(Decimal::new(1999, 2)));
    }

    #[test]
    fn strips_thousands_separator() {
        let header = FieldFormatHeader::new("price", false, "", "").unwrap();
        let format = DecimalFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        let value = format.validated_value("1,234.5", &sealed_format(), &location).unwrap();
        assert_eq!(value, FieldValue::Decimal(Decimal::new(12345, 1)));
    }

    #[test]
    fn rejects_doubled_decimal_separator() {
        let header = FieldFormatHeader::new("price", false, "", "").unwrap();
        let format = DecimalFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("1.2.3", &sealed_format(), &location).is_err());
    }

    #[test]
    fn rejects_thousands_separator_after_decimal_point() {
        let header = FieldFormatHeader::new("price", false, "", "").unwrap();
        let format = DecimalFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("1.2,3", &sealed_format(), &location).is_err());
    }

    #[test]
    fn rule_range_restricts_value() {
        let header = FieldFormatHeader::new("price", false, "", "0...100").unwrap();
        let format = DecimalFieldFormat::new(header).unwrap();
        let location = Location::new("test");
        assert!(format.validated_value("100.5", &sealed_format(), &location).is_err());
    }
}
