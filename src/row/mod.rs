//! Row readers: turn a data source into a stream of `Vec<String>` rows.
//!
//! Every format family (`delimited`, `fixed`, `excel`, `ods`) is read
//! through the same `Iterator<Item = Result<Vec<String>>>` contract so the
//! validator never needs to know which one it is driving. `auto` picks a
//! family from a file name suffix for callers that don't already have a CID.

pub mod auto;
pub mod delimited;
pub mod excel;
pub mod fixed;
pub mod ods;
pub mod writer;

pub use writer::RowWriter;

use std::path::Path;

use crate::data_format::{DataFormat, DataFormatFamily};
use crate::error::{CutplaceError, Location, Result};

/// A field name paired with its fixed-width column width, in declaration
/// order, as required by the `fixed` family.
pub type FieldWidth = (String, usize);

/// Reads rows out of a data source, dispatching to the family named by a
/// sealed [`DataFormat`].
pub enum RowReader {
    Delimited(delimited::DelimitedReader),
    Fixed(fixed::FixedReader),
    Excel(excel::ExcelReader),
    Ods(ods::OdsReader),
}

impl RowReader {
    /// Opens `path` for reading according to `data_format`. `field_widths`
    /// is only consulted for the `fixed` family, where it supplies the
    /// column widths the CID's field formats declared.
    pub fn open(data_format: &DataFormat, path: &Path, field_widths: &[FieldWidth]) -> Result<Self> {
        let source_name = path.display().to_string();
        match data_format.family() {
            DataFormatFamily::Delimited => {
                let bytes = std::fs::read(path)?;
                Ok(RowReader::Delimited(delimited::DelimitedReader::new(data_format, &source_name, &bytes)?))
            }
            DataFormatFamily::Fixed => {
                let bytes = std::fs::read(path)?;
                Ok(RowReader::Fixed(fixed::FixedReader::new(data_format, &source_name, &bytes, field_widths)?))
            }
            DataFormatFamily::Excel => Ok(RowReader::Excel(excel::ExcelReader::open(data_format, path)?)),
            DataFormatFamily::Ods => Ok(RowReader::Ods(ods::OdsReader::open(data_format, path)?)),
        }
    }

    /// The location of the row most recently produced (or about to be, if
    /// nothing has been read yet).
    pub fn location(&self) -> &Location {
        match self {
            RowReader::Delimited(reader) => reader.location(),
            RowReader::Fixed(reader) => reader.location(),
            RowReader::Excel(reader) => reader.location(),
            RowReader::Ods(reader) => reader.location(),
        }
    }
}

impl Iterator for RowReader {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RowReader::Delimited(reader) => reader.next(),
            RowReader::Fixed(reader) => reader.next(),
            RowReader::Excel(reader) => reader.next(),
            RowReader::Ods(reader) => reader.next(),
        }
    }
}

pub(crate) fn unsupported_family(operation: &str, family: DataFormatFamily) -> CutplaceError {
    CutplaceError::data_format(format!("{} is not supported for the {:?} format", operation, family))
}
