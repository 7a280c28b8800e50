//! Validating reader/writer: drives a row reader/writer through the field
//! formats and checks declared by a sealed [`Cid`].

use std::collections::HashMap;
use std::path::Path;

use crate::checks::Check;
use crate::cid::Cid;
use crate::data_format::DataFormatFamily;
use crate::error::{CutplaceError, Location, Result};
use crate::field_format::FieldValue;
use crate::row::{FieldWidth, RowReader, RowWriter};

/// How a validation failure on a single row is handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OnError {
    /// Propagate the error, terminating iteration.
    Raise,
    /// Discard the row and move on to the next one.
    Continue,
    /// Emit the error in place of the row.
    Yield,
}

fn fixed_field_widths(cid: &Cid) -> Vec<FieldWidth> {
    cid.fields()
        .iter()
        .map(|field| {
            let header = field.header();
            let width = header
                .length
                .lower_limit()
                .map(|value| value.trunc().to_string().parse::<usize>().unwrap_or(0))
                .unwrap_or(0);
            (header.name.clone(), width)
        })
        .collect()
}

fn validate_row(cid: &Cid, checks: &mut [Check], row: &[String], location: &Location) -> Result<HashMap<String, FieldValue>> {
    if row.len() != cid.fields().len() {
        return Err(CutplaceError::data_format(format!(
            "row must contain {} value(s) but contains {}: {:?}",
            cid.fields().len(),
            row.len(),
            row
        ))
        .with_location(location.clone()));
    }

    let mut field_name_to_value_map = HashMap::with_capacity(row.len());
    for (index, field) in cid.fields().iter().enumerate() {
        let mut cell_location = location.clone();
        cell_location.set_cell(index);
        let value = field
            .validated(&row[index], cid.data_format(), &cell_location)
            .map_err(|error| error.prepend_message(&format!("cannot accept field {:?}", field.name()), cell_location.clone()))?;
        field_name_to_value_map.insert(field.name().to_string(), value);
    }

    for check in checks.iter_mut() {
        check.check_row(&field_name_to_value_map, location)?;
    }

    Ok(field_name_to_value_map)
}

/// Reads rows out of a source, validating each one against a [`Cid`].
pub struct Reader<'a> {
    cid: &'a Cid,
    checks: Vec<Check>,
    row_reader: RowReader,
    on_error: OnError,
    validate_until: Option<u64>,
    header: u64,
    row_index: u64,
    accepted_count: u64,
    closed: bool,
    stopped: bool,
}

impl<'a> Reader<'a> {
    /// `cid` must already be sealed (it always is once constructed by
    /// [`crate::cid::build_cid_from_rows`]). `validate_until` bounds how
    /// many post-header rows are validated; `None` means all of them.
    pub fn new(cid: &'a Cid, path: &Path, on_error: OnError, validate_until: Option<u64>) -> Result<Self> {
        let field_widths = if cid.data_format().family() == DataFormatFamily::Fixed {
            fixed_field_widths(cid)
        } else {
            Vec::new()
        };
        let row_reader = RowReader::open(cid.data_format(), path, &field_widths)?;
        let mut checks = cid.checks().to_vec();
        for check in checks.iter_mut() {
            check.reset();
        }
        tracing::debug!(path = %path.display(), "opened validating reader");
        Ok(Reader {
            cid,
            checks,
            row_reader,
            on_error,
            validate_until,
            header: cid.data_format().header(),
            row_index: 0,
            accepted_count: 0,
            closed: false,
            stopped: false,
        })
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count
    }

    fn within_validation_window(&self, row_number: u64) -> bool {
        match self.validate_until {
            None => true,
            Some(validate_until) => row_number <= self.header + validate_until,
        }
    }

    fn run_check_at_end(&self) -> Result<()> {
        let location = self.row_reader.location().clone();
        for check in &self.checks {
            check.check_at_end(&location)?;
        }
        Ok(())
    }

    /// Runs `check_at_end` on every check and releases the underlying
    /// stream. Always run this (or [`Reader::abort`]) before dropping a
    /// reader that validated anything worth trusting.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.run_check_at_end()
    }

    /// Releases the underlying stream without running `check_at_end`,
    /// for callers abandoning a pass early (e.g. after a fatal error).
    pub fn abort(mut self) {
        self.closed = true;
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        loop {
            let row = match self.row_reader.next()? {
                Ok(row) => row,
                Err(error) => {
                    self.stopped = true;
                    return Some(Err(error));
                }
            };
            self.row_index += 1;

            if self.row_index <= self.header || !self.within_validation_window(self.row_index) {
                return Some(Ok(row));
            }

            let location = self.row_reader.location().clone();
            match validate_row(self.cid, &mut self.checks, &row, &location) {
                Ok(_) => {
                    self.accepted_count += 1;
                    return Some(Ok(row));
                }
                Err(error) => match self.on_error {
                    OnError::Raise => {
                        self.stopped = true;
                        return Some(Err(error));
                    }
                    OnError::Continue => {
                        tracing::warn!(%error, "discarding row that failed validation");
                        continue;
                    }
                    OnError::Yield => return Some(Err(error)),
                },
            }
        }
    }
}

impl<'a> Drop for Reader<'a> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(error) = self.run_check_at_end() {
                tracing::error!(%error, "reader dropped without an explicit close(); end-of-stream checks failed");
            }
        }
    }
}

/// Writes rows to a sink, validating each one against a [`Cid`] before
/// serializing it. Does not run `check_at_end`.
pub struct Writer<'a> {
    cid: &'a Cid,
    checks: Vec<Check>,
    row_writer: RowWriter,
    location: Location,
}

impl<'a> Writer<'a> {
    pub fn new(cid: &'a Cid, path: &Path) -> Result<Self> {
        let field_widths = if cid.data_format().family() == DataFormatFamily::Fixed {
            fixed_field_widths(cid)
        } else {
            Vec::new()
        };
        let row_writer = RowWriter::open(cid.data_format(), path, &field_widths)?;
        let mut checks = cid.checks().to_vec();
        for check in checks.iter_mut() {
            check.reset();
        }
        tracing::debug!(path = %path.display(), "opened validating writer");
        Ok(Writer {
            cid,
            checks,
            row_writer,
            location: Location::with_cell(path.display().to_string()),
        })
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        validate_row(self.cid, &mut self.checks, row, &self.location)?;
        self.row_writer.write_row(row)?;
        self.location.advance_line(1);
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.row_writer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::io::Write;

    fn cid_with_rows(rows: &[&[&str]]) -> Cid {
        let registry = Registry::with_builtins();
        let rows: Vec<Vec<String>> = rows.iter().map(|row| row.iter().map(|cell| cell.to_string()).collect()).collect();
        crate::cid::build_cid_from_rows(&rows, "test.cid", &registry).unwrap()
    }

    fn data_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn raise_policy_stops_at_first_bad_row() {
        let cid = cid_with_rows(&[&["d", "format", "delimited"], &["f", "branch", "", "", "", "Integer", ""]]);
        let file = data_file("38000\nnot-a-number\n38100\n");
        let mut reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
        assert_eq!(reader.next().unwrap().unwrap(), vec!["38000"]);
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn continue_policy_skips_bad_rows() {
        let cid = cid_with_rows(&[&["d", "format", "delimited"], &["f", "branch", "", "", "", "Integer", ""]]);
        let file = data_file("38000\nnot-a-number\n38100\n");
        let reader = Reader::new(&cid, file.path(), OnError::Continue, None).unwrap();
        let rows: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows, vec![vec!["38000"], vec!["38100"]]);
    }

    #[test]
    fn yield_policy_emits_error_in_place_of_row() {
        let cid = cid_with_rows(&[&["d", "format", "delimited"], &["f", "branch", "", "", "", "Integer", ""]]);
        let file = data_file("38000\nnot-a-number\n38100\n");
        let mut reader = Reader::new(&cid, file.path(), OnError::Yield, None).unwrap();
        let results: Vec<_> = (0..3).map(|_| reader.next().unwrap()).collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn header_rows_are_not_validated() {
        let cid = cid_with_rows(&[
            &["d", "format", "delimited"],
            &["d", "header", "1"],
            &["f", "branch", "", "", "", "Integer", ""],
        ]);
        let file = data_file("not-a-number-but-its-a-header\n38000\n");
        let reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
        let rows: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows, vec![vec!["not-a-number-but-its-a-header"], vec!["38000"]]);
    }

    #[test]
    fn check_at_end_runs_on_close_and_catches_unmet_distinct_count() {
        let cid = cid_with_rows(&[
            &["d", "format", "delimited"],
            &["f", "branch", "", "", "", "Integer", ""],
            &["c", "exactly two rows", "DistinctCount", "branch == 2"],
        ]);
        let file = data_file("38000\n");
        let mut reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
        for _ in reader.by_ref() {}
        assert!(reader.close().is_err());
    }

    #[test]
    fn writer_validates_rows_before_delegating_to_row_writer() {
        let cid = cid_with_rows(&[&["d", "format", "delimited"], &["f", "branch", "", "", "", "Integer", ""]]);
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let mut writer = Writer::new(&cid, file.path()).unwrap();
        writer.write_row(&["38000".to_string()]).unwrap();
        assert!(writer.write_row(&["not-a-number".to_string()]).is_err());
        writer.close().unwrap();
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, "38000\n");
    }
}
