//! Column Interface Definition: loads a sealed [`DataFormat`], an ordered
//! list of [`FieldFormat`]s, and a list of [`Check`]s from rows of cells.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::checks::Check;
use crate::data_format::{DataFormat, DataFormatFamily};
use crate::error::{CutplaceError, Location};
use crate::field_format::FieldFormat;
use crate::registry::Registry;

const ROW_TAG_DATA_FORMAT: &str = "d";
const ROW_TAG_FIELD: &str = "f";
const ROW_TAG_CHECK: &str = "c";
const DEFAULT_FIELD_TYPE: &str = "Text";
const EMPTY_FLAG_INDICATOR: &str = "x";

fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn parse_empty_flag(text: &str, location: &Location) -> crate::error::Result<bool> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        Ok(false)
    } else if normalized == EMPTY_FLAG_INDICATOR {
        Ok(true)
    } else {
        Err(CutplaceError::interface(format!(
            "mark for empty field must be {:?} or empty but is: {:?}",
            EMPTY_FLAG_INDICATOR, text
        ))
        .with_location(location.clone()))
    }
}

/// A loaded, immutable Column Interface Definition.
#[derive(Clone, Debug)]
pub struct Cid {
    data_format: DataFormat,
    fields: Vec<FieldFormat>,
    field_name_to_index: HashMap<String, usize>,
    checks: Vec<Check>,
}

impl Cid {
    pub fn data_format(&self) -> &DataFormat {
        &self.data_format
    }

    pub fn fields(&self) -> &[FieldFormat] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_name_to_index.get(name).copied()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name().to_string()).collect()
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|check| check.description()).collect()
    }
}

/// Builds a [`Cid`] from rows already decoded into strings, dispatching on
/// each row's first cell: empty/blank (comment), `d` (data format
/// property), `f` (field declaration), or `c` (check declaration).
pub fn build_cid_from_rows(rows: &[Vec<String>], source_name: &str, registry: &Registry) -> crate::error::Result<Cid> {
    let mut location = Location::with_cell(source_name);
    let mut data_format: Option<DataFormat> = None;
    let mut sealed = false;

    let mut fields: Vec<FieldFormat> = Vec::new();
    let mut field_name_to_index: HashMap<String, usize> = HashMap::new();
    let mut field_name_to_location: HashMap<String, Location> = HashMap::new();

    let mut checks: Vec<Check> = Vec::new();
    let mut check_description_to_location: HashMap<String, Location> = HashMap::new();

    for row in rows {
        location.set_cell(0);
        let tag = cell(row, 0).trim().to_lowercase();

        if tag.is_empty() {
            location.advance_line(1);
            continue;
        }

        if (tag == ROW_TAG_FIELD || tag == ROW_TAG_CHECK) && !sealed {
            let format = data_format.as_mut().ok_or_else(|| {
                CutplaceError::interface("data format must be specified before first field or check")
                    .with_location(location.clone())
            })?;
            format.validate().map_err(|error| error.prepend_message("broken data format", location.clone()))?;
            sealed = true;
        }

        match tag.as_str() {
            _ if tag == ROW_TAG_DATA_FORMAT => {
                location.set_cell(1);
                let property_name = cell(row, 1).trim().to_lowercase();
                if property_name.is_empty() {
                    return Err(CutplaceError::interface("data format property name must not be empty")
                        .with_location(location.clone()));
                }
                location.set_cell(2);
                let value = cell(row, 2);

                if property_name == "format" {
                    if data_format.is_some() {
                        return Err(CutplaceError::interface("data format must be set only once")
                            .with_location(location.clone()));
                    }
                    let family = DataFormatFamily::from_name(value).at_location(&location)?;
                    data_format = Some(DataFormat::new(family));
                } else {
                    let format = data_format.as_mut().ok_or_else(|| {
                        CutplaceError::interface(format!(
                            "first data format property must be {:?} but is: {:?}",
                            "format", property_name
                        ))
                        .with_location(location.clone())
                    })?;
                    format.set_property(&property_name, value).at_location(&location)?;
                }
            }
            _ if tag == ROW_TAG_FIELD => {
                let name = cell(row, 1).trim();
                if name.is_empty() {
                    return Err(CutplaceError::interface(
                        "field format row must at least contain a field name",
                    )
                    .with_location(location.clone()));
                }

                location.set_cell(2);
                let example = cell(row, 2).trim();
                location.set_cell(3);
                let is_allowed_to_be_empty = parse_empty_flag(cell(row, 3), &location)?;
                location.set_cell(4);
                let length = cell(row, 4).trim();
                location.set_cell(5);
                let type_name = {
                    let raw = cell(row, 5).trim();
                    if raw.is_empty() {
                        DEFAULT_FIELD_TYPE.to_string()
                    } else {
                        raw.to_string()
                    }
                };
                location.set_cell(6);
                let rule = cell(row, 6).trim();

                let format = data_format
                    .as_ref()
                    .expect("data format is sealed before the first field row");
                let field_format = registry
                    .build_field_format(&type_name, name, is_allowed_to_be_empty, length, rule, format)
                    .at_location(&location)?;

                if !example.is_empty() {
                    field_format
                        .check_example(&Some(example.to_string()), format)
                        .map_err(|error| {
                            CutplaceError::interface(format!(
                                "cannot validate example for field {:?}: {}",
                                name, error
                            ))
                            .with_location(location.clone())
                        })?;
                }

                if let Some(first_location) = field_name_to_location.get(name) {
                    return Err(CutplaceError::interface(format!(
                        "field name must be used for only one field: {}",
                        name
                    ))
                    .with_location(location.clone())
                    .with_see_also("first declared here", first_location.clone()));
                }

                if format.family() == DataFormatFamily::Fixed {
                    let length_range = &field_format.header().length;
                    if length_range.is_unbounded() {
                        return Err(CutplaceError::interface(format!(
                            "length of field {:?} must be specified with fixed data format",
                            name
                        ))
                        .with_location(location.clone()));
                    }
                    let is_single_value_at_least_one = match (length_range.lower_limit(), length_range.upper_limit()) {
                        (Some(lower), Some(upper)) => lower == upper && lower >= Decimal::ONE,
                        _ => false,
                    };
                    if !is_single_value_at_least_one {
                        return Err(CutplaceError::interface(format!(
                            "length of field {:?} for fixed data format must be a single value of at least 1 but is: {}",
                            name, length_range
                        ))
                        .with_location(location.clone()));
                    }
                }

                field_name_to_location.insert(name.to_string(), location.clone());
                field_name_to_index.insert(name.to_string(), fields.len());
                fields.push(field_format);
            }
            _ if tag == ROW_TAG_CHECK => {
                let description = cell(row, 1).trim();
                if description.is_empty() {
                    return Err(CutplaceError::interface(
                        "check row must at least contain a description and a type",
                    )
                    .with_location(location.clone()));
                }
                location.set_cell(2);
                let type_name = cell(row, 2).trim();
                if type_name.is_empty() {
                    return Err(CutplaceError::interface("check row must specify a type")
                        .with_location(location.clone()));
                }
                location.set_cell(3);
                let rule = cell(row, 3).trim();

                let available_field_names: Vec<String> = fields.iter().map(|field| field.name().to_string()).collect();
                let mut definition_location = location.clone();
                definition_location.set_cell(1);
                let check = registry
                    .build_check(type_name, description, rule, &available_field_names, definition_location)
                    .at_location(&location)?;

                if let Some(first_location) = check_description_to_location.get(description) {
                    return Err(CutplaceError::interface(format!(
                        "check description must be used only once: {:?}",
                        description
                    ))
                    .with_location(location.clone())
                    .with_see_also("first declared here", first_location.clone()));
                }
                check_description_to_location.insert(description.to_string(), location.clone());
                checks.push(check);
            }
            _ => {
                return Err(CutplaceError::interface(format!(
                    "first item in CID row is {:?} but must be empty or one of: d, f, c",
                    cell(row, 0)
                ))
                .with_location(location.clone()));
            }
        }

        location.advance_line(1);
    }

    let data_format = data_format.ok_or_else(|| {
        CutplaceError::interface("CID must contain a section describing the data format (rows starting with \"d\")")
    })?;
    if !sealed {
        return Err(CutplaceError::interface(
            "CID must contain at least one field or check to seal the data format",
        ));
    }
    if fields.is_empty() {
        return Err(CutplaceError::interface(
            "CID must contain a section describing at least one field format (rows starting with \"f\")",
        ));
    }

    Ok(Cid {
        data_format,
        fields,
        field_name_to_index,
        checks,
    })
}

trait AtLocation<T> {
    fn at_location(self, location: &Location) -> crate::error::Result<T>;
}

impl<T> AtLocation<T> for crate::error::Result<T> {
    fn at_location(self, location: &Location) -> crate::error::Result<T> {
        self.map_err(|error| if error.location.is_none() { error.with_location(location.clone()) } else { error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn builds_minimal_delimited_cid() {
        let registry = Registry::with_builtins();
        let rows = vec![
            row(&["d", "format", "delimited"]),
            row(&["f", "branch", "38000", "", "", "Integer", ""]),
            row(&["f", "customer", "23", "", "", "Integer", ""]),
        ];
        let cid = build_cid_from_rows(&rows, "test.csv", &registry).unwrap();
        assert_eq!(cid.fields().len(), 2);
        assert_eq!(cid.field_index("branch"), Some(0));
    }

    #[test]
    fn rejects_duplicate_field_name() {
        let registry = Registry::with_builtins();
        let rows = vec![
            row(&["d", "format", "delimited"]),
            row(&["f", "branch", "", "", "", "Integer", ""]),
            row(&["f", "branch", "", "", "", "Integer", ""]),
        ];
        assert!(build_cid_from_rows(&rows, "test.csv", &registry).is_err());
    }

    #[test]
    fn rejects_missing_data_format() {
        let registry = Registry::with_builtins();
        let rows = vec![row(&["f", "branch", "", "", "", "Integer", ""])];
        assert!(build_cid_from_rows(&rows, "test.csv", &registry).is_err());
    }

    #[test]
    fn rejects_format_set_twice() {
        let registry = Registry::with_builtins();
        let rows = vec![
            row(&["d", "format", "delimited"]),
            row(&["d", "format", "fixed"]),
            row(&["f", "branch", "", "", "", "Integer", ""]),
        ];
        assert!(build_cid_from_rows(&rows, "test.csv", &registry).is_err());
    }

    #[test]
    fn builds_cid_with_check_referencing_declared_field() {
        let registry = Registry::with_builtins();
        let rows = vec![
            row(&["d", "format", "delimited"]),
            row(&["f", "branch", "", "", "", "Integer", ""]),
            row(&["c", "unique branch", "IsUnique", "branch"]),
        ];
        let cid = build_cid_from_rows(&rows, "test.csv", &registry).unwrap();
        assert_eq!(cid.checks().len(), 1);
        assert_eq!(cid.check_names(), vec!["unique branch"]);
    }

    #[test]
    fn rejects_check_referencing_unknown_field() {
        let registry = Registry::with_builtins();
        let rows = vec![
            row(&["d", "format", "delimited"]),
            row(&["f", "branch", "", "", "", "Integer", ""]),
            row(&["c", "unique missing", "IsUnique", "missing"]),
        ];
        assert!(build_cid_from_rows(&rows, "test.csv", &registry).is_err());
    }

    #[test]
    fn rejects_duplicate_check_description() {
        let registry = Registry::with_builtins();
        let rows = vec![
            row(&["d", "format", "delimited"]),
            row(&["f", "branch", "", "", "", "Integer", ""]),
            row(&["c", "unique branch", "IsUnique", "branch"]),
            row(&["c", "unique branch", "IsUnique", "branch"]),
        ];
        assert!(build_cid_from_rows(&rows, "test.csv", &registry).is_err());
    }

    #[test]
    fn rejects_no_fields() {
        let registry = Registry::with_builtins();
        let rows = vec![row(&["d", "format", "delimited"]), row(&["c", "x", "IsUnique", "branch"])];
        assert!(build_cid_from_rows(&rows, "test.csv", &registry).is_err());
    }
}
