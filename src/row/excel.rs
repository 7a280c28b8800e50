//! Row reader for the `excel` family (`.xls`/`.xlsx`/`.xlsb`), backed by
//! `calamine` rather than a hand-rolled parser for either binary format.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::data_format::DataFormat;
use crate::error::{CutplaceError, Location, Result};

pub struct ExcelReader {
    rows: std::vec::IntoIter<Vec<String>>,
    location: Location,
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Bool(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => value.to_string(),
        Data::DateTime(value) => {
            if let Some(time) = value.as_time() {
                time.format("%H:%M:%S").to_string()
            } else if let Some(datetime) = value.as_datetime() {
                datetime.format("%Y-%m-%d %H:%M:%S").to_string()
            } else {
                String::new()
            }
        }
        Data::DateTimeIso(value) => value.clone(),
        Data::DurationIso(value) => value.clone(),
        Data::Error(error) => error.to_string(),
    }
}

impl ExcelReader {
    pub fn open(data_format: &DataFormat, path: &Path) -> Result<Self> {
        let source_name = path.display().to_string();
        let mut workbook = open_workbook_auto(path)?;
        let sheet_index = (data_format.sheet().max(1) - 1) as usize;
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names.get(sheet_index).cloned().ok_or_else(|| {
            CutplaceError::data_format(format!(
                "sheet {} does not exist, workbook only has {} sheet(s)",
                data_format.sheet(),
                sheet_names.len()
            ))
            .with_location(Location::new(&source_name))
        })?;
        let range = workbook.worksheet_range(&sheet_name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(render_cell).collect::<Vec<String>>())
            .collect::<Vec<_>>();

        let mut location = Location::with_sheet(&source_name);
        for _ in 0..sheet_index {
            location.advance_sheet();
        }

        Ok(ExcelReader {
            rows: rows.into_iter(),
            location,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl Iterator for ExcelReader {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        self.location.advance_line(1);
        Some(Ok(row))
    }
}
