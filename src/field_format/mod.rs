//! Field formats: typed per-column validators.
//!
//! Every kind shares one algorithm in [`FieldFormat::validated`]: check
//! emptiness, then length, then the data format's allowed character set,
//! then delegate to the kind's own parse. Kinds are a closed family modeled
//! as a tagged enum (not a trait object) per the design note preferring
//! sum types over class hierarchies for closed families.

pub mod choice;
pub mod constant;
pub mod datetime;
pub mod decimal;
pub mod integer;
pub mod pattern;
pub mod regex_format;
pub mod text;

use rust_decimal::Decimal;

use crate::data_format::DataFormat;
use crate::error::{CutplaceError, Location};
use crate::range::Range;

/// The typed result of validating a cell against a field format.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    DateTime(chrono::NaiveDateTime),
    Choice(String),
    Pattern(String),
    RegEx(String),
    Constant(String),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(value)
            | FieldValue::Choice(value)
            | FieldValue::Pattern(value)
            | FieldValue::RegEx(value)
            | FieldValue::Constant(value) => value.clone(),
            FieldValue::Integer(value) => value.to_string(),
            FieldValue::Decimal(value) => value.to_string(),
            FieldValue::DateTime(value) => value.to_string(),
        }
    }
}

/// Attributes shared by every field format kind.
#[derive(Clone, Debug)]
pub struct FieldFormatHeader {
    pub name: String,
    pub is_allowed_to_be_empty: bool,
    pub length: Range,
    pub rule: String,
}

impl FieldFormatHeader {
    pub fn new(name: &str, is_allowed_to_be_empty: bool, length_text: &str, rule: &str) -> crate::error::Result<Self> {
        validate_field_name(name)?;
        let length = Range::with_default(Some(length_text), None)?;
        Ok(FieldFormatHeader {
            name: name.to_string(),
            is_allowed_to_be_empty,
            length,
            rule: rule.to_string(),
        })
    }
}

const RESERVED_FIELD_NAMES: &[&str] = &["true", "false", "none", "null"];

fn validate_field_name(name: &str) -> crate::error::Result<()> {
    if name.is_empty() {
        return Err(CutplaceError::interface("field name must not be empty"));
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(CutplaceError::interface(format!(
            "field name must start with a lowercase letter or underscore but is: {:?}",
            name
        )));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(CutplaceError::interface(format!(
            "field name must only contain lowercase ASCII letters, digits, and underscores but is: {:?}",
            name
        )));
    }
    if RESERVED_FIELD_NAMES.contains(&name) {
        return Err(CutplaceError::interface(format!(
            "field name must not be a reserved word but is: {:?}",
            name
        )));
    }
    Ok(())
}

/// A constructed, typed field format. See submodules for per-kind rules.
#[derive(Clone, Debug)]
pub enum FieldFormat {
    Text(text::TextFieldFormat),
    Integer(integer::IntegerFieldFormat),
    Decimal(decimal::DecimalFieldFormat),
    DateTime(datetime::DateTimeFieldFormat),
    Choice(choice::ChoiceFieldFormat),
    Pattern(pattern::PatternFieldFormat),
    RegEx(regex_format::RegExFieldFormat),
    Constant(constant::ConstantFieldFormat),
}

impl FieldFormat {
    pub fn header(&self) -> &FieldFormatHeader {
        match self {
            FieldFormat::Text(f) => &f.header,
            FieldFormat::Integer(f) => &f.header,
            FieldFormat::Decimal(f) => &f.header,
            FieldFormat::DateTime(f) => &f.header,
            FieldFormat::Choice(f) => &f.header,
            FieldFormat::Pattern(f) => &f.header,
            FieldFormat::RegEx(f) => &f.header,
            FieldFormat::Constant(f) => &f.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    fn validated_value(
        &self,
        text: &str,
        data_format: &DataFormat,
        location: &Location,
    ) -> crate::error::Result<FieldValue> {
        match self {
            FieldFormat::Text(f) => f.validated_value(text),
            FieldFormat::Integer(f) => f.validated_value(text, location),
            FieldFormat::Decimal(f) => f.validated_value(text, data_format, location),
            FieldFormat::DateTime(f) => f.validated_value(text, location),
            FieldFormat::Choice(f) => f.validated_value(text, location),
            FieldFormat::Pattern(f) => f.validated_value(text, location),
            FieldFormat::RegEx(f) => f.validated_value(text, location),
            FieldFormat::Constant(f) => f.validated_value(text, location),
        }
    }

    fn empty_value(&self) -> FieldValue {
        match self {
            FieldFormat::Text(_) => FieldValue::Text(String::new()),
            FieldFormat::Integer(_) => FieldValue::Integer(0),
            FieldFormat::Decimal(_) => FieldValue::Decimal(Decimal::ZERO),
            FieldFormat::DateTime(_) => FieldValue::DateTime(chrono::NaiveDateTime::default()),
            FieldFormat::Choice(_) => FieldValue::Choice(String::new()),
            FieldFormat::Pattern(_) => FieldValue::Pattern(String::new()),
            FieldFormat::RegEx(_) => FieldValue::RegEx(String::new()),
            FieldFormat::Constant(_) => FieldValue::Constant(String::new()),
        }
    }

    /// The shared four-step algorithm: empty check, length check, allowed
    /// character check, then the kind's own parse.
    pub fn validated(
        &self,
        text: &str,
        data_format: &DataFormat,
        location: &Location,
    ) -> crate::error::Result<FieldValue> {
        let header = self.header();
        if text.is_empty() {
            return if header.is_allowed_to_be_empty {
                Ok(self.empty_value())
            } else {
                Err(CutplaceError::field_value(format!(
                    "field {:?} must not be empty",
                    header.name
                ))
                .with_location(location.clone()))
            };
        }

        let length = text.chars().count() as i64;
        header
            .length
            .validate_count(&format!("length of field {:?}", header.name), length, location)
            .map_err(|error| CutplaceError::field_value(error.message).with_location(location.clone()))?;

        if let Some(allowed_characters) = data_format.allowed_characters() {
            for (column, character) in text.chars().enumerate() {
                if allowed_characters
                    .validate_count("character", character as i64, location)
                    .is_err()
                {
                    return Err(CutplaceError::field_value(format!(
                        "field {:?} must only contain allowed characters but character {:?} (code point {}) at column {} is not allowed",
                        header.name,
                        character,
                        character as u32,
                        column + 1
                    ))
                    .with_location(location.clone()));
                }
            }
        }

        self.validated_value(text, data_format, location)
    }

    /// Validates `example` at construction time, matching the contract
    /// that any non-empty example must itself validate.
    pub fn check_example(&self, example: &Option<String>, data_format: &DataFormat) -> crate::error::Result<()> {
        if let Some(example) = example {
            if !example.is_empty() {
                let location = Location::new("<example>");
                self.validated(example, data_format, &location)?;
            }
        }
        Ok(())
    }
}
