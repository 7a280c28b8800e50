//! Row reader for the `ods` family (OpenDocument Spreadsheet): unzips
//! `content.xml` and walks `table:table-row`/`table:table-cell` elements
//! into plain string rows, simplified from a typed cell model since every
//! value still passes through a field format's own text parser.

use std::path::Path;

use quick_xml::events::Event;
use zip::ZipArchive;

use crate::data_format::DataFormat;
use crate::error::{CutplaceError, Location, Result};
use crate::helpers::xml::{XmlNodeHelper, XmlTextContextHelper};
use crate::helpers::zip::ZipHelper;

pub struct OdsReader {
    rows: std::vec::IntoIter<Vec<String>>,
    location: Location,
}

fn is_password_protected<R: std::io::Read + std::io::Seek>(archive: &mut ZipArchive<R>) -> Result<bool> {
    let Some(mut manifest) = archive.xml_reader("META-INF/manifest.xml")? else {
        return Ok(false);
    };
    while let Some(event) = manifest.next()? {
        if let Event::Start(tag) | Event::Empty(tag) = &event {
            if tag.local_name().as_ref() == b"encryption-data" {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn read_rows<R: std::io::Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    source_name: &str,
    target_table_index: usize,
) -> Result<Vec<Vec<String>>> {
    let mut content = archive.xml_reader("content.xml")?.ok_or_else(|| {
        CutplaceError::data_format("ODS archive is missing content.xml").with_location(Location::new(source_name))
    })?;

    let mut table_index = 0usize;
    let mut in_target_table = false;
    let mut table_seen = false;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut row_repeat = 1usize;
    let mut cell_repeat = 1usize;
    let mut cell_text = String::new();
    let mut cell_fallback: Option<String> = None;
    let mut in_cell = false;
    let mut in_paragraph = false;

    while let Some(event) = content.next()? {
        match event {
            Event::Start(tag) => {
                let local = tag.local_name();
                match local.as_ref() {
                    b"table" => {
                        in_target_table = table_index == target_table_index;
                        table_seen = table_seen || in_target_table;
                        table_index += 1;
                    }
                    b"table-row" if in_target_table => {
                        row_repeat = tag.parse_attribute_value::<usize>("table:number-rows-repeated")?.unwrap_or(1).max(1);
                        current_row = Vec::new();
                    }
                    b"table-cell" | b"covered-table-cell" if in_target_table => {
                        cell_repeat = tag
                            .parse_attribute_value::<usize>("table:number-columns-repeated")?
                            .unwrap_or(1)
                            .max(1);
                        cell_text = String::new();
                        cell_fallback = tag
                            .get_attribute_value("office:value")?
                            .or(tag.get_attribute_value("office:boolean-value")?)
                            .or(tag.get_attribute_value("office:date-value")?)
                            .or(tag.get_attribute_value("office:time-value")?)
                            .or(tag.get_attribute_value("office:string-value")?)
                            .map(|value| value.into_owned());
                        in_cell = true;
                    }
                    b"p" if in_cell => {
                        if !cell_text.is_empty() {
                            cell_text.push('\n');
                        }
                        in_paragraph = true;
                    }
                    b"s" if in_paragraph => {
                        let count = tag.parse_attribute_value::<usize>("text:c")?.unwrap_or(1);
                        for _ in 0..count {
                            cell_text.push(' ');
                        }
                    }
                    _ => {}
                }
            }
            Event::End(tag) => {
                let local = tag.local_name();
                match local.as_ref() {
                    b"table" => {
                        if in_target_table {
                            break;
                        }
                    }
                    b"table-row" if in_target_table => {
                        for _ in 0..row_repeat {
                            rows.push(current_row.clone());
                        }
                    }
                    b"table-cell" | b"covered-table-cell" if in_target_table => {
                        let value = if cell_text.is_empty() {
                            cell_fallback.take().unwrap_or_default()
                        } else {
                            cell_text.clone()
                        };
                        for _ in 0..cell_repeat {
                            current_row.push(value.clone());
                        }
                        in_cell = false;
                    }
                    b"p" => in_paragraph = false,
                    _ => {}
                }
            }
            Event::Text(text) if in_paragraph => cell_text.push_bytes_text(&text)?,
            Event::GeneralRef(bytes_ref) if in_paragraph => cell_text.push_bytes_ref(&bytes_ref)?,
            _ => {}
        }
    }

    if !table_seen {
        return Err(CutplaceError::data_format(format!("ODS workbook does not have a sheet at index {}", target_table_index + 1))
            .with_location(Location::new(source_name)));
    }

    Ok(rows)
}

impl OdsReader {
    pub fn open(data_format: &DataFormat, path: &Path) -> Result<Self> {
        let source_name = path.display().to_string();
        let file = std::fs::File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        if is_password_protected(&mut archive)? {
            return Err(CutplaceError::data_format("password-protected ODS files are not supported")
                .with_location(Location::new(&source_name)));
        }

        let target_table_index = (data_format.sheet().max(1) - 1) as usize;
        let rows = read_rows(&mut archive, &source_name, target_table_index)?;

        let mut location = Location::with_sheet(&source_name);
        for _ in 0..target_table_index {
            location.advance_sheet();
        }

        Ok(OdsReader {
            rows: rows.into_iter(),
            location,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl Iterator for OdsReader {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        self.location.advance_line(1);
        Some(Ok(row))
    }
}
