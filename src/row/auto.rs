//! Suffix-based dispatch for callers that have a file path but no CID yet.

use std::path::Path;

use crate::data_format::{DataFormat, DataFormatFamily};
use crate::error::Result;
use crate::row::{FieldWidth, RowReader};

/// Builds a permissive default `DataFormat` and opens `path` with it,
/// picking the family from the file's lower-case suffix: `ods`, `xls`, and
/// `xlsx` get their dedicated readers, anything else is read as delimited.
pub fn auto_rows(path: &Path) -> Result<RowReader> {
    let suffix = path.extension().and_then(|ext| ext.to_str()).unwrap_or("").to_ascii_lowercase();
    let family = match suffix.as_str() {
        "ods" => DataFormatFamily::Ods,
        "xls" | "xlsx" => DataFormatFamily::Excel,
        _ => DataFormatFamily::Delimited,
    };
    let mut data_format = DataFormat::new(family);
    data_format.validate()?;
    let empty_widths: Vec<FieldWidth> = Vec::new();
    RowReader::open(&data_format, path, &empty_widths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dispatches_delimited_by_default_suffix() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "a,b\n1,2\n").unwrap();
        let rows: Vec<_> = auto_rows(file.path()).unwrap().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
    }
}
