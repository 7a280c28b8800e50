//! Data format: the property bag that describes how raw bytes become rows
//! (`delimited`, `fixed`, `excel`, `ods`), with a `set_property`/`validate`
//! sealing lifecycle.
//!
//! A property, once set, cannot be set again; `validate()` fills in
//! defaults, checks cross-property consistency, and seals the format so
//! that field formats and row readers can rely on it never changing again.

use std::collections::HashSet;
use std::fmt;

use crate::error::CutplaceError;
use crate::range::Range;

/// Which row reader/writer family this format configures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataFormatFamily {
    Delimited,
    Fixed,
    Excel,
    Ods,
}

impl DataFormatFamily {
    pub fn from_name(name: &str) -> crate::error::Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "delimited" | "csv" => Ok(DataFormatFamily::Delimited),
            "fixed" => Ok(DataFormatFamily::Fixed),
            "excel" => Ok(DataFormatFamily::Excel),
            "ods" => Ok(DataFormatFamily::Ods),
            other => Err(CutplaceError::interface(format!(
                "format must be one of: delimited, fixed, excel, ods but is: {:?}",
                other
            ))),
        }
    }

    fn name(self) -> &'static str {
        match self {
            DataFormatFamily::Delimited => "delimited",
            DataFormatFamily::Fixed => "fixed",
            DataFormatFamily::Excel => "excel",
            DataFormatFamily::Ods => "ods",
        }
    }

    fn is_spreadsheet(self) -> bool {
        matches!(self, DataFormatFamily::Excel | DataFormatFamily::Ods)
    }

    fn is_tabular_text(self) -> bool {
        matches!(self, DataFormatFamily::Delimited | DataFormatFamily::Fixed)
    }
}

/// How a record boundary is recognized/emitted for `delimited`/`fixed`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineDelimiter {
    Lf,
    Cr,
    CrLf,
    /// Accept any of `\n`, `\r`, `\r\n` (fixed/delimited reading only).
    Any,
    /// Records abut with no delimiter (`fixed` only).
    None,
}

impl LineDelimiter {
    fn from_name(name: &str, family: DataFormatFamily) -> crate::error::Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lf" => Ok(LineDelimiter::Lf),
            "cr" => Ok(LineDelimiter::Cr),
            "crlf" => Ok(LineDelimiter::CrLf),
            "any" => Ok(LineDelimiter::Any),
            "none" if family == DataFormatFamily::Fixed => Ok(LineDelimiter::None),
            other => Err(CutplaceError::interface(format!(
                "line delimiter must be one of: lf, cr, crlf, any{} but is: {:?}",
                if family == DataFormatFamily::Fixed { ", none" } else { "" },
                other
            ))),
        }
    }

    pub fn as_bytes(self) -> &'static str {
        match self {
            LineDelimiter::Lf => "\n",
            LineDelimiter::Cr => "\r",
            LineDelimiter::CrLf => "\r\n",
            LineDelimiter::Any | LineDelimiter::None => "",
        }
    }
}

/// How fields are quoted when writing a `delimited` row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuotingMode {
    /// Only quote a field when it contains the delimiter, quote character,
    /// or a line break.
    Minimal,
    /// Quote every field.
    All,
    /// Never quote (the caller guarantees no field contains the delimiter).
    None,
}

impl QuotingMode {
    fn from_name(name: &str) -> crate::error::Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "minimal" => Ok(QuotingMode::Minimal),
            "all" => Ok(QuotingMode::All),
            "none" => Ok(QuotingMode::None),
            other => Err(CutplaceError::interface(format!(
                "quoting must be one of: minimal, all, none but is: {:?}",
                other
            ))),
        }
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_ascii_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a "character" property value: a decimal code point, `0x…` hex, a
/// symbolic name (`cr`/`ff`/`lf`/`tab`/`vt`), or a quoted single character.
fn parse_character(raw_value: &str) -> crate::error::Result<char> {
    let text = raw_value.trim();
    if text.len() >= 2 {
        let mut chars = text.chars();
        let first = chars.next().unwrap();
        let last = text.chars().last().unwrap();
        if (first == '\'' || first == '"') && first == last && text.chars().count() == 3 {
            return Ok(text.chars().nth(1).unwrap());
        }
    }
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| CutplaceError::interface(format!("character must be a valid hex code but is: {:?}", text)))?;
        return char::from_u32(code)
            .ok_or_else(|| CutplaceError::interface(format!("character code point is not valid: {:?}", text)));
    }
    if let Ok(code) = text.parse::<u32>() {
        return char::from_u32(code)
            .ok_or_else(|| CutplaceError::interface(format!("character code point is not valid: {:?}", text)));
    }
    match text.to_ascii_lowercase().as_str() {
        "cr" => return Ok('\r'),
        "ff" => return Ok('\u{0C}'),
        "lf" => return Ok('\n'),
        "tab" => return Ok('\t'),
        "vt" => return Ok('\u{0B}'),
        _ => {}
    }
    if text.chars().count() == 1 {
        return Ok(text.chars().next().unwrap());
    }
    Err(CutplaceError::interface(format!(
        "character must be a code point, symbolic name, or quoted character but is: {:?}",
        text
    )))
}

fn parse_bool(raw_value: &str) -> crate::error::Result<bool> {
    match raw_value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(CutplaceError::interface(format!(
            "value must be a boolean but is: {:?}",
            other
        ))),
    }
}

fn parse_count(raw_value: &str) -> crate::error::Result<u64> {
    raw_value
        .trim()
        .parse::<u64>()
        .map_err(|_| CutplaceError::interface(format!("value must be a non-negative integer but is: {:?}", raw_value)))
}

/// A property bag describing how to read/write rows, sealed by
/// [`DataFormat::validate`].
#[derive(Clone, Debug)]
pub struct DataFormat {
    family: DataFormatFamily,
    sealed: bool,
    already_set: HashSet<String>,

    encoding: Option<String>,
    header: Option<u64>,
    allowed_characters: Option<Range>,
    line_delimiter: Option<LineDelimiter>,
    decimal_separator: Option<char>,
    thousands_separator: Option<char>,
    item_delimiter: Option<char>,
    quote_character: Option<char>,
    escape_character: Option<char>,
    skip_initial_space: Option<bool>,
    quoting: Option<QuotingMode>,
    sheet: Option<u64>,
}

impl DataFormat {
    pub fn new(family: DataFormatFamily) -> Self {
        DataFormat {
            family,
            sealed: false,
            already_set: HashSet::new(),
            encoding: None,
            header: None,
            allowed_characters: None,
            line_delimiter: None,
            decimal_separator: None,
            thousands_separator: None,
            item_delimiter: None,
            quote_character: None,
            escape_character: None,
            skip_initial_space: None,
            quoting: None,
            sheet: None,
        }
    }

    pub fn family(&self) -> DataFormatFamily {
        self.family
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Assigns a property by its CID name. Fails if the format is already
    /// sealed, the property was already set, or the property does not
    /// apply to this format's family.
    pub fn set_property(&mut self, name: &str, raw_value: &str) -> crate::error::Result<()> {
        if self.sealed {
            return Err(CutplaceError::interface(format!(
                "cannot set property {:?} because the data format is already sealed",
                name
            )));
        }
        let key = normalize_key(name);
        if !self.already_set.insert(key.clone()) {
            return Err(CutplaceError::interface(format!(
                "data format property {:?} has already been set",
                key
            )));
        }
        match key.as_str() {
            "encoding" => self.encoding = Some(raw_value.trim().to_string()),
            "header" => self.header = Some(parse_count(raw_value)?),
            "allowed characters" => self.allowed_characters = Some(Range::parse(raw_value)?),
            "line delimiter" => self.line_delimiter = Some(LineDelimiter::from_name(raw_value, self.family)?),
            "decimal separator" => self.decimal_separator = Some(parse_character(raw_value)?),
            "thousands separator" => self.thousands_separator = Some(parse_character(raw_value)?),
            "item delimiter" => {
                self.reject_unless(self.family == DataFormatFamily::Delimited, &key)?;
                self.item_delimiter = Some(parse_character(raw_value)?);
            }
            "quote character" => {
                self.reject_unless(self.family == DataFormatFamily::Delimited, &key)?;
                self.quote_character = Some(parse_character(raw_value)?);
            }
            "escape character" => {
                self.reject_unless(self.family == DataFormatFamily::Delimited, &key)?;
                self.escape_character = Some(parse_character(raw_value)?);
            }
            "skip initial space" => {
                self.reject_unless(self.family == DataFormatFamily::Delimited, &key)?;
                self.skip_initial_space = Some(parse_bool(raw_value)?);
            }
            "quoting" => {
                self.reject_unless(self.family == DataFormatFamily::Delimited, &key)?;
                self.quoting = Some(QuotingMode::from_name(raw_value)?);
            }
            "sheet" => {
                self.reject_unless(self.family.is_spreadsheet(), &key)?;
                let sheet = parse_count(raw_value)?;
                if sheet < 1 {
                    return Err(CutplaceError::interface("sheet must be a positive integer"));
                }
                self.sheet = Some(sheet);
            }
            other => {
                return Err(CutplaceError::interface(format!(
                    "data format property {:?} is not recognized",
                    other
                )))
            }
        }
        Ok(())
    }

    fn reject_unless(&self, allowed: bool, key: &str) -> crate::error::Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(CutplaceError::interface(format!(
                "data format property {:?} does not apply to format {:?}",
                key,
                self.family.name()
            )))
        }
    }

    /// Fills in defaults, checks cross-property consistency, and seals the
    /// format. Further `set_property` calls fail after this succeeds.
    pub fn validate(&mut self) -> crate::error::Result<()> {
        if self.sealed {
            return Ok(());
        }
        if self.encoding.is_none() {
            self.encoding = Some("utf-8".to_string());
        }
        if self.header.is_none() {
            self.header = Some(0);
        }
        if self.decimal_separator.is_none() {
            self.decimal_separator = Some('.');
        }
        if self.thousands_separator.is_none() {
            self.thousands_separator = Some(',');
        }
        if self.family == DataFormatFamily::Delimited {
            if self.item_delimiter.is_none() {
                self.item_delimiter = Some(',');
            }
            if self.quote_character.is_none() {
                self.quote_character = Some('"');
            }
            if self.escape_character.is_none() {
                self.escape_character = self.quote_character;
            }
            if self.skip_initial_space.is_none() {
                self.skip_initial_space = Some(false);
            }
            if self.quoting.is_none() {
                self.quoting = Some(QuotingMode::Minimal);
            }
        }
        if self.family.is_tabular_text() && self.line_delimiter.is_none() {
            self.line_delimiter = Some(LineDelimiter::Any);
        }

        if self.decimal_separator == self.thousands_separator {
            return Err(CutplaceError::interface(format!(
                "decimal separator and thousands separator must be different but both are: {:?}",
                self.decimal_separator.unwrap()
            )));
        }

        if self.family == DataFormatFamily::Delimited {
            let item_delimiter = self.item_delimiter.unwrap();
            let quote_character = self.quote_character.unwrap();
            if item_delimiter == '\0' {
                return Err(CutplaceError::interface("item delimiter must not be the null character"));
            }
            if item_delimiter == quote_character {
                return Err(CutplaceError::interface(format!(
                    "item delimiter must differ from quote character but both are: {:?}",
                    item_delimiter
                )));
            }
            if let Some(line_delimiter) = self.line_delimiter {
                if line_delimiter.as_bytes().contains(item_delimiter) {
                    return Err(CutplaceError::interface(
                        "item delimiter must not be part of the line delimiter",
                    ));
                }
            }
        }

        if self.family != DataFormatFamily::Fixed && matches!(self.line_delimiter, Some(LineDelimiter::None)) {
            return Err(CutplaceError::interface(
                "line delimiter \"none\" is only valid for the fixed format",
            ));
        }

        self.sealed = true;
        Ok(())
    }

    fn sealed_or_panic(&self) {
        debug_assert!(self.sealed, "DataFormat accessed before validate() sealed it");
    }

    pub fn encoding(&self) -> &str {
        self.sealed_or_panic();
        self.encoding.as_deref().unwrap_or("utf-8")
    }

    pub fn header(&self) -> u64 {
        self.sealed_or_panic();
        self.header.unwrap_or(0)
    }

    pub fn allowed_characters(&self) -> Option<&Range> {
        self.allowed_characters.as_ref()
    }

    pub fn line_delimiter(&self) -> Option<LineDelimiter> {
        self.line_delimiter
    }

    pub fn decimal_separator(&self) -> char {
        self.sealed_or_panic();
        self.decimal_separator.unwrap_or('.')
    }

    pub fn thousands_separator(&self) -> char {
        self.sealed_or_panic();
        self.thousands_separator.unwrap_or(',')
    }

    pub fn item_delimiter(&self) -> char {
        self.sealed_or_panic();
        self.item_delimiter.unwrap_or(',')
    }

    pub fn quote_character(&self) -> Option<char> {
        self.quote_character
    }

    pub fn escape_character(&self) -> Option<char> {
        self.escape_character
    }

    pub fn skip_initial_space(&self) -> bool {
        self.skip_initial_space.unwrap_or(false)
    }

    pub fn quoting(&self) -> QuotingMode {
        self.quoting.unwrap_or(QuotingMode::Minimal)
    }

    pub fn sheet(&self) -> u64 {
        self.sheet.unwrap_or(1)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataFormat({}", self.family.name())?;
        if let Some(encoding) = &self.encoding {
            write!(f, ", encoding={}", encoding)?;
        }
        if let Some(header) = self.header {
            write!(f, ", header={}", header)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_on_validate() {
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        format.validate().unwrap();
        assert_eq!(format.encoding(), "utf-8");
        assert_eq!(format.item_delimiter(), ',');
        assert_eq!(format.quote_character(), Some('"'));
    }

    #[test]
    fn property_cannot_be_set_twice() {
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        format.set_property("encoding", "utf-8").unwrap();
        let error = format.set_property("encoding", "ascii").unwrap_err();
        assert_eq!(error.kind, crate::error::ErrorKind::Interface);
    }

    #[test]
    fn sealed_format_rejects_further_properties() {
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        format.validate().unwrap();
        assert!(format.set_property("encoding", "ascii").is_err());
    }

    #[test]
    fn item_delimiter_must_differ_from_quote_character() {
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        format.set_property("item delimiter", "\"").unwrap();
        assert!(format.validate().is_err());
    }

    #[test]
    fn decimal_and_thousands_separator_must_differ() {
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        format.set_property("decimal separator", ".").unwrap();
        format.set_property("thousands separator", ".").unwrap();
        assert!(format.validate().is_err());
    }

    #[test]
    fn sheet_rejected_on_delimited() {
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        assert!(format.set_property("sheet", "1").is_err());
    }

    #[test]
    fn item_delimiter_rejected_on_fixed() {
        let mut format = DataFormat::new(DataFormatFamily::Fixed);
        assert!(format.set_property("item delimiter", ",").is_err());
    }

    #[test]
    fn none_line_delimiter_only_for_fixed() {
        let mut format = DataFormat::new(DataFormatFamily::Fixed);
        format.set_property("line delimiter", "none").unwrap();
        format.validate().unwrap();
        assert_eq!(format.line_delimiter(), Some(LineDelimiter::None));
    }

    #[test]
    fn symbolic_character_property() {
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        format.set_property("item delimiter", "tab").unwrap();
        format.validate().unwrap();
        assert_eq!(format.item_delimiter(), '\t');
    }
}
