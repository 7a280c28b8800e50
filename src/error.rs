//! Source locations and the crate-wide error type.
//!
//! Every error produced by this crate carries a [`Location`], a human
//! readable message, an optional `see_also` location/message pair, and an
//! optional underlying cause, rendered the way the canonical format the
//! error-reporting contract requires: `"<location>: <message> (see also:
//! ...)"`.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Which part of the validation pipeline raised an error.
///
/// `interface` errors come from a broken CID, `data-format` errors from data
/// that cannot be parsed into rows/cells, `field-value` from a cell that
/// does not match its field format, `check` from a row/end check, and
/// `range-value` from a value outside a declared range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Interface,
    DataFormat,
    FieldValue,
    Check,
    RangeValue,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::Interface => "interface",
            ErrorKind::DataFormat => "data-format",
            ErrorKind::FieldValue => "field-value",
            ErrorKind::Check => "check",
            ErrorKind::RangeValue => "range-value",
        };
        f.write_str(text)
    }
}

/// A cursor into an input: file path (or synthetic stream name), a
/// zero-based line, and optionally a column, cell, and sheet.
#[derive(Clone, Debug)]
pub struct Location {
    name: String,
    line: usize,
    column: Option<usize>,
    cell: Option<usize>,
    sheet: Option<usize>,
}

impl Location {
    /// A location that only ever tracks a line (raw byte/text streams).
    pub fn new(name: impl Into<String>) -> Self {
        Location {
            name: name.into(),
            line: 0,
            column: None,
            cell: None,
            sheet: None,
        }
    }

    /// A location that also tracks a character column within the line.
    pub fn with_column(name: impl Into<String>) -> Self {
        let mut location = Location::new(name);
        location.column = Some(0);
        location
    }

    /// A location that tracks a cell index within a row (tabular inputs).
    pub fn with_cell(name: impl Into<String>) -> Self {
        let mut location = Location::new(name);
        location.cell = Some(0);
        location
    }

    /// A location that additionally tracks a sheet index (spreadsheets).
    pub fn with_sheet(name: impl Into<String>) -> Self {
        let mut location = Location::with_cell(name);
        location.sheet = Some(0);
        location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn cell(&self) -> Option<usize> {
        self.cell
    }

    pub fn sheet(&self) -> Option<usize> {
        self.sheet
    }

    /// Advances to the next line, resetting column and cell (not sheet).
    pub fn advance_line(&mut self, amount: usize) {
        self.line += amount.max(1);
        if self.column.is_some() {
            self.column = Some(0);
        }
        if self.cell.is_some() {
            self.cell = Some(0);
        }
    }

    pub fn advance_column(&mut self, amount: usize) {
        if let Some(column) = self.column.as_mut() {
            *column += amount.max(1);
        }
    }

    pub fn advance_cell(&mut self, amount: usize) {
        if let Some(cell) = self.cell.as_mut() {
            *cell += amount.max(1);
        }
    }

    pub fn set_cell(&mut self, new_cell: usize) {
        if self.cell.is_some() {
            self.cell = Some(new_cell);
        }
    }

    pub fn set_column(&mut self, new_column: usize) {
        if self.column.is_some() {
            self.column = Some(new_column);
        }
    }

    /// Advances to the next sheet, resetting line, column, and cell.
    pub fn advance_sheet(&mut self) {
        if let Some(sheet) = self.sheet.as_mut() {
            *sheet += 1;
            self.line = 0;
            self.column = self.column.map(|_| 0);
            self.cell = self.cell.map(|_| 0);
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.name)?;
        if let Some(cell) = self.cell {
            if let Some(sheet) = self.sheet {
                write!(f, "Sheet{}!", sheet + 1)?;
            }
            write!(f, "R{}C{}", self.line + 1, cell + 1)?;
        } else {
            write!(f, "{}", self.line + 1)?;
        }
        if let Some(column) = self.column {
            write!(f, ";{}", column + 1)?;
        }
        write!(f, ")")
    }
}

/// The crate-wide error: plain data carrying a [`Location`], message, an
/// optional `see_also` location/message, and an optional underlying cause.
///
/// Every fallible public operation in this crate returns `Result<T>` with
/// this error type. [`ErrorKind`] is an explicit tag rather than something
/// inferred from the Rust type, which is what lets callers match on
/// `interface` / `data-format` / `field-value` / `check` / `range-value`.
#[derive(Debug)]
pub struct CutplaceError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
    pub see_also_location: Option<Location>,
    pub see_also_message: Option<String>,
    pub cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl CutplaceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CutplaceError {
            kind,
            message: message.into(),
            location: None,
            see_also_location: None,
            see_also_message: None,
            cause: None,
        }
    }

    pub fn interface(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interface, message)
    }

    pub fn data_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataFormat, message)
    }

    pub fn field_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldValue, message)
    }

    pub fn check(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Check, message)
    }

    pub fn range_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeValue, message)
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_see_also(mut self, message: impl Into<String>, location: Location) -> Self {
        self.see_also_message = Some(message.into());
        self.see_also_location = Some(location);
        self
    }

    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Prepends `prefix` to the message and replaces the location, matching
    /// the CID loader's "cannot accept field 'X'" wrapping.
    pub fn prepend_message(mut self, prefix: &str, new_location: Location) -> Self {
        self.message = format!("{}: {}", prefix, self.message);
        self.location = Some(new_location);
        self
    }
}

impl fmt::Display for CutplaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(see_also_message) = &self.see_also_message {
            write!(f, " (see also: ")?;
            if let Some(see_also_location) = &self.see_also_location {
                write!(f, "{}: ", see_also_location)?;
            }
            write!(f, "{})", see_also_message)?;
        }
        Ok(())
    }
}

impl StdError for CutplaceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// The row readers read bytes before this crate can attach a `Location`,
/// so the raw I/O/archive/XML errors they encounter are aggregated here
/// the way the teacher's `RustySheetError` aggregates third-party errors,
/// one `#[error("{0}")]` variant per source via `#[from]`.
#[derive(Error, Debug)]
pub(crate) enum RowSourceError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Excel(#[from] calamine::Error),
}

impl From<RowSourceError> for CutplaceError {
    fn from(error: RowSourceError) -> Self {
        CutplaceError::data_format(error.to_string()).with_cause(error)
    }
}

impl From<std::io::Error> for CutplaceError {
    fn from(error: std::io::Error) -> Self {
        RowSourceError::from(error).into()
    }
}

impl From<zip::result::ZipError> for CutplaceError {
    fn from(error: zip::result::ZipError) -> Self {
        RowSourceError::from(error).into()
    }
}

impl From<quick_xml::Error> for CutplaceError {
    fn from(error: quick_xml::Error) -> Self {
        RowSourceError::from(error).into()
    }
}

impl From<calamine::Error> for CutplaceError {
    fn from(error: calamine::Error) -> Self {
        RowSourceError::from(error).into()
    }
}

pub type Result<T> = std::result::Result<T, CutplaceError>;

/// Attaches a [`Location`] to any error that can be turned into a
/// [`CutplaceError`], mirroring how the teacher's `ResultMessage::with_prefix`
/// attaches context to a bare error.
pub trait ResultLocation<T> {
    fn at(self, location: Location) -> Result<T>;
}

impl<T, E> ResultLocation<T> for std::result::Result<T, E>
where
    E: Into<CutplaceError>,
{
    fn at(self, location: Location) -> Result<T> {
        self.map_err(|error| {
            let mut error = error.into();
            if error.location.is_none() {
                error.location = Some(location);
            }
            error
        })
    }
}

pub trait ResultMessage<T> {
    fn with_prefix(self, message: &str) -> Result<T>;
}

impl<T> ResultMessage<T> for Result<T> {
    fn with_prefix(self, message: &str) -> Result<T> {
        self.map_err(|error| CutplaceError {
            message: format!("{}: {}", message, error.message),
            ..error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_line_only_location() {
        let location = Location::new("data.txt");
        assert_eq!(location.to_string(), "data.txt (1)");
    }

    #[test]
    fn renders_column_location() {
        let mut location = Location::with_column("data.txt");
        location.advance_column(3);
        assert_eq!(location.to_string(), "data.txt (1;4)");
    }

    #[test]
    fn renders_cell_location() {
        let mut location = Location::with_cell("data.csv");
        location.advance_cell(1);
        assert_eq!(location.to_string(), "data.csv (R1C2)");
    }

    #[test]
    fn renders_sheet_cell_location() {
        let location = Location::with_sheet("data.ods");
        assert_eq!(location.to_string(), "data.ods (Sheet1!R1C1)");
    }

    #[test]
    fn advance_line_resets_cell() {
        let mut location = Location::with_cell("data.csv");
        location.advance_cell(2);
        location.advance_line(1);
        assert_eq!(location.to_string(), "data.csv (R2C1)");
    }

    #[test]
    fn advance_sheet_resets_line_and_cell() {
        let mut location = Location::with_sheet("data.ods");
        location.advance_cell(2);
        location.advance_line(3);
        location.advance_sheet();
        assert_eq!(location.to_string(), "data.ods (Sheet2!R1C1)");
    }

    #[test]
    fn renders_see_also() {
        let error = CutplaceError::check("duplicate key")
            .with_location(Location::new("data.csv"))
            .with_see_also("location of first occurrence", Location::new("data.csv"));
        assert_eq!(
            error.to_string(),
            "data.csv (1): duplicate key (see also: data.csv (1): location of first occurrence)"
        );
    }
}
