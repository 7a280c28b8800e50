//! Row and end-of-stream checks: predicates over either a single row or
//! the complete validation pass.

use std::collections::HashMap;

use evalexpr::{ContextWithMutableVariables, HashMapContext, Value as EvalValue};

use crate::error::{CutplaceError, Location};
use crate::field_format::FieldValue;

/// A named predicate declared in a CID. Checks are a closed family (like
/// field formats), dispatched through a tagged enum rather than a trait
/// object.
#[derive(Clone, Debug)]
pub enum Check {
    IsUnique(IsUniqueCheck),
    DistinctCount(DistinctCountCheck),
}

impl Check {
    pub fn description(&self) -> &str {
        match self {
            Check::IsUnique(check) => &check.description,
            Check::DistinctCount(check) => &check.description,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Check::IsUnique(check) => check.reset(),
            Check::DistinctCount(check) => check.reset(),
        }
    }

    pub fn check_row(
        &mut self,
        field_name_to_value_map: &HashMap<String, FieldValue>,
        location: &Location,
    ) -> crate::error::Result<()> {
        match self {
            Check::IsUnique(check) => check.check_row(field_name_to_value_map, location),
            Check::DistinctCount(check) => check.check_row(field_name_to_value_map),
        }
    }

    pub fn check_at_end(&self, location: &Location) -> crate::error::Result<()> {
        match self {
            Check::IsUnique(_) => Ok(()),
            Check::DistinctCount(check) => check.check_at_end(location),
        }
    }

    pub fn cleanup(&mut self) {
        match self {
            Check::IsUnique(check) => check.reset(),
            Check::DistinctCount(check) => check.reset(),
        }
    }
}

fn validate_field_name_in_cid(field_name: &str, available_field_names: &[String]) -> crate::error::Result<()> {
    if available_field_names.iter().any(|name| name == field_name) {
        Ok(())
    } else {
        Err(CutplaceError::interface(format!(
            "field {:?} referenced by check must be declared in the CID",
            field_name
        )))
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Ensures every row's tuple of named field values is unique within a pass.
#[derive(Clone, Debug)]
pub struct IsUniqueCheck {
    description: String,
    rule: String,
    location_of_definition: Location,
    field_names_to_check: Vec<String>,
    row_key_to_location: HashMap<Vec<String>, Location>,
}

impl IsUniqueCheck {
    pub fn new(
        description: &str,
        rule: &str,
        available_field_names: &[String],
        location_of_definition: Location,
    ) -> crate::error::Result<Self> {
        if available_field_names.is_empty() {
            return Err(CutplaceError::interface("field names must be specified before check"));
        }
        let mut field_names_to_check = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for raw_name in rule.split(',') {
            let name = raw_name.trim();
            if name.is_empty() || !name.chars().next().unwrap().is_alphabetic() && name.chars().next().unwrap() != '_'
                || !name.chars().all(is_identifier_char)
            {
                return Err(CutplaceError::interface(format!(
                    "field name must contain only ASCII letters, numbers, and underscores but found: {:?}",
                    name
                )));
            }
            validate_field_name_in_cid(name, available_field_names)?;
            if !seen.insert(name.to_string()) {
                return Err(CutplaceError::interface(format!(
                    "duplicate field name for unique check must be removed: {}",
                    name
                )));
            }
            field_names_to_check.push(name.to_string());
        }
        if field_names_to_check.is_empty() {
            return Err(CutplaceError::interface(
                "rule must contain at least one field name to check for uniqueness",
            ));
        }
        Ok(IsUniqueCheck {
            description: description.to_string(),
            rule: rule.to_string(),
            location_of_definition,
            field_names_to_check,
            row_key_to_location: HashMap::new(),
        })
    }

    pub fn location_of_definition(&self) -> &Location {
        &self.location_of_definition
    }

    pub fn reset(&mut self) {
        self.row_key_to_location.clear();
    }

    pub fn check_row(
        &mut self,
        field_name_to_value_map: &HashMap<String, FieldValue>,
        location: &Location,
    ) -> crate::error::Result<()> {
        let row_key: Vec<String> = self
            .field_names_to_check
            .iter()
            .map(|name| field_name_to_value_map.get(name).map(FieldValue::as_text).unwrap_or_default())
            .collect();
        if let Some(first_location) = self.row_key_to_location.get(&row_key) {
            return Err(CutplaceError::check(format!(
                "values for {:?} must be unique: {:?}",
                self.field_names_to_check, row_key
            ))
            .with_location(location.clone())
            .with_see_also("location of first occurrence", first_location.clone()));
        }
        self.row_key_to_location.insert(row_key, location.clone());
        Ok(())
    }

    pub fn description_ref(&self) -> &str {
        &self.description
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }
}

/// Ensures the number of distinct values seen for a field matches an
/// expression evaluated at the end of the pass.
#[derive(Clone, Debug)]
pub struct DistinctCountCheck {
    description: String,
    rule: String,
    location_of_definition: Location,
    field_name_to_count: String,
    expression: String,
    distinct_value_to_count: HashMap<String, i64>,
}

fn eval_count_expression(expression: &str, count: i64) -> crate::error::Result<bool> {
    let mut context = HashMapContext::new();
    context
        .set_value("count".into(), EvalValue::Int(count))
        .expect("setting a context variable cannot fail");
    evalexpr::eval_boolean_with_context(expression, &context).map_err(|error| {
        CutplaceError::interface(format!("cannot evaluate count expression {:?}: {}", expression, error))
    })
}

impl DistinctCountCheck {
    pub fn new(
        description: &str,
        rule: &str,
        available_field_names: &[String],
        location_of_definition: Location,
    ) -> crate::error::Result<Self> {
        if available_field_names.is_empty() {
            return Err(CutplaceError::interface("field names must be specified before check"));
        }
        let trimmed = rule.trim_start();
        let field_name_end = trimmed
            .find(|c: char| !is_identifier_char(c))
            .unwrap_or(trimmed.len());
        if field_name_end == 0 {
            return Err(CutplaceError::interface(format!(
                "rule must start with a field name but found: {:?}",
                rule
            )));
        }
        let field_name_to_count = trimmed[..field_name_end].to_string();
        validate_field_name_in_cid(&field_name_to_count, available_field_names)?;

        let expression = format!("count{}", &trimmed[field_name_end..]);
        // Evaluated once here with count=0 so a broken expression surfaces
        // as an interface error at construction, not at end-of-pass.
        eval_count_expression(&expression, 0)?;

        Ok(DistinctCountCheck {
            description: description.to_string(),
            rule: rule.to_string(),
            location_of_definition,
            field_name_to_count,
            expression,
            distinct_value_to_count: HashMap::new(),
        })
    }

    pub fn location_of_definition(&self) -> &Location {
        &self.location_of_definition
    }

    pub fn reset(&mut self) {
        self.distinct_value_to_count.clear();
    }

    fn distinct_count(&self) -> i64 {
        self.distinct_value_to_count.len() as i64
    }

    pub fn check_row(&mut self, field_name_to_value_map: &HashMap<String, FieldValue>) -> crate::error::Result<()> {
        if let Some(value) = field_name_to_value_map.get(&self.field_name_to_count) {
            *self.distinct_value_to_count.entry(value.as_text()).or_insert(0) += 1;
        }
        Ok(())
    }

    pub fn check_at_end(&self, location: &Location) -> crate::error::Result<()> {
        if !eval_count_expression(&self.expression, self.distinct_count())? {
            return Err(CutplaceError::check(format!(
                "distinct count is {} but check requires: {}",
                self.distinct_count(),
                self.expression
            ))
            .with_location(location.clone()));
        }
        Ok(())
    }

    pub fn description_ref(&self) -> &str {
        &self.description
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }
}
