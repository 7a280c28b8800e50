//! Extensible registry mapping CID kind names to constructors.
//!
//! This is the one extensibility seam inside the core: everything else
//! (how a plugin directory is scanned, how a name reaches the registry at
//! startup) lives outside this crate. The registry itself only knows how
//! to look a name up and call its constructor.

use std::collections::HashMap;

use crate::checks::{Check, DistinctCountCheck, IsUniqueCheck};
use crate::data_format::DataFormat;
use crate::error::{CutplaceError, Location};
use crate::field_format::{FieldFormat, FieldFormatHeader};
use crate::field_format::{choice, constant, datetime, decimal, integer, pattern, regex_format, text};

/// `(name, is_empty_allowed, length, rule, data_format) -> FieldFormat`
pub type FieldFormatConstructor =
    fn(&str, bool, &str, &str, &DataFormat) -> crate::error::Result<FieldFormat>;

/// `(description, rule, field_names, location) -> Check`
pub type CheckConstructor =
    fn(&str, &str, &[String], Location) -> crate::error::Result<Check>;

fn make_text(name: &str, is_empty_allowed: bool, length: &str, rule: &str, _: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::Text(text::TextFieldFormat::new(header)?))
}

fn make_integer(name: &str, is_empty_allowed: bool, length: &str, rule: &str, data_format: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::Integer(integer::IntegerFieldFormat::new(header, data_format)?))
}

fn make_decimal(name: &str, is_empty_allowed: bool, length: &str, rule: &str, _: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::Decimal(decimal::DecimalFieldFormat::new(header)?))
}

fn make_datetime(name: &str, is_empty_allowed: bool, length: &str, rule: &str, _: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::DateTime(datetime::DateTimeFieldFormat::new(header)?))
}

fn make_choice(name: &str, is_empty_allowed: bool, length: &str, rule: &str, _: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::Choice(choice::ChoiceFieldFormat::new(header)?))
}

fn make_pattern(name: &str, is_empty_allowed: bool, length: &str, rule: &str, _: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::Pattern(pattern::PatternFieldFormat::new(header)?))
}

fn make_regex(name: &str, is_empty_allowed: bool, length: &str, rule: &str, _: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::RegEx(regex_format::RegExFieldFormat::new(header)?))
}

fn make_constant(name: &str, is_empty_allowed: bool, length: &str, rule: &str, _: &DataFormat) -> crate::error::Result<FieldFormat> {
    let header = FieldFormatHeader::new(name, is_empty_allowed, length, rule)?;
    Ok(FieldFormat::Constant(constant::ConstantFieldFormat::new(header)?))
}

fn make_is_unique(description: &str, rule: &str, field_names: &[String], location: Location) -> crate::error::Result<Check> {
    Ok(Check::IsUnique(IsUniqueCheck::new(description, rule, field_names, location)?))
}

fn make_distinct_count(description: &str, rule: &str, field_names: &[String], location: Location) -> crate::error::Result<Check> {
    Ok(Check::DistinctCount(DistinctCountCheck::new(description, rule, field_names, location)?))
}

/// Looks field-format and check kind names up by the name written in a CID
/// (`"Text"`, `"IsUnique"`, ...) and calls the matching constructor.
pub struct Registry {
    field_formats: HashMap<String, FieldFormatConstructor>,
    checks: HashMap<String, CheckConstructor>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            field_formats: HashMap::new(),
            checks: HashMap::new(),
        }
    }

    /// A registry pre-populated with the eight built-in field formats and
    /// two built-in checks this crate ships.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        registry.register_field_format("Text", make_text);
        registry.register_field_format("Integer", make_integer);
        registry.register_field_format("Decimal", make_decimal);
        registry.register_field_format("DateTime", make_datetime);
        registry.register_field_format("Choice", make_choice);
        registry.register_field_format("Pattern", make_pattern);
        registry.register_field_format("RegEx", make_regex);
        registry.register_field_format("Constant", make_constant);
        registry.register_check("IsUnique", make_is_unique);
        registry.register_check("DistinctCount", make_distinct_count);
        registry
    }

    pub fn register_field_format(&mut self, kind_name: &str, constructor: FieldFormatConstructor) {
        self.field_formats.insert(kind_name.to_string(), constructor);
    }

    pub fn register_check(&mut self, kind_name: &str, constructor: CheckConstructor) {
        self.checks.insert(kind_name.to_string(), constructor);
    }

    pub fn field_format_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.field_formats.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn check_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn build_field_format(
        &self,
        kind_name: &str,
        name: &str,
        is_empty_allowed: bool,
        length: &str,
        rule: &str,
        data_format: &DataFormat,
    ) -> crate::error::Result<FieldFormat> {
        let constructor = self.field_formats.get(kind_name).ok_or_else(|| {
            CutplaceError::interface(format!(
                "field format kind {:?} is not registered; must be one of: {}",
                kind_name,
                self.field_format_kinds().join(", ")
            ))
        })?;
        constructor(name, is_empty_allowed, length, rule, data_format)
    }

    pub fn build_check(
        &self,
        kind_name: &str,
        description: &str,
        rule: &str,
        field_names: &[String],
        location: Location,
    ) -> crate::error::Result<Check> {
        let constructor = self.checks.get(kind_name).ok_or_else(|| {
            CutplaceError::interface(format!(
                "check kind {:?} is not registered; must be one of: {}",
                kind_name,
                self.check_kinds().join(", ")
            ))
        })?;
        constructor(description, rule, field_names, location)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_format::DataFormatFamily;

    #[test]
    fn builds_known_field_format() {
        let registry = Registry::with_builtins();
        let mut data_format = DataFormat::new(DataFormatFamily::Delimited);
        data_format.validate().unwrap();
        let format = registry
            .build_field_format("Text", "comment", true, "", "", &data_format)
            .unwrap();
        assert_eq!(format.name(), "comment");
    }

    #[test]
    fn unknown_field_format_kind_is_interface_error() {
        let registry = Registry::with_builtins();
        let data_format = DataFormat::new(DataFormatFamily::Delimited);
        assert!(registry
            .build_field_format("Nonsense", "x", false, "", "", &data_format)
            .is_err());
    }

    #[test]
    fn builds_known_check() {
        let registry = Registry::with_builtins();
        let fields = vec!["branch".to_string()];
        let check = registry
            .build_check("IsUnique", "unique branch", "branch", &fields, Location::new("cid"))
            .unwrap();
        assert_eq!(check.description(), "unique branch");
    }

    #[test]
    fn unknown_check_kind_is_interface_error() {
        let registry = Registry::with_builtins();
        let fields = vec!["branch".to_string()];
        assert!(registry
            .build_check("Nonsense", "d", "branch", &fields, Location::new("cid"))
            .is_err());
    }
}
