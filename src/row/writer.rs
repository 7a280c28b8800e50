//! Row writers for the `delimited` and `fixed` families. Excel/ODS are
//! read-only in this engine (§4.7 only specifies delimited/fixed writers).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use encoding_rs::Encoding;

use crate::data_format::{DataFormat, DataFormatFamily, LineDelimiter};
use crate::error::{CutplaceError, Location, Result};
use crate::row::{unsupported_family, FieldWidth};

pub enum RowWriter {
    Delimited(DelimitedWriter),
    Fixed(FixedWriter),
}

impl RowWriter {
    /// Opens `path` for writing according to `data_format`. `field_widths`
    /// is only consulted for the `fixed` family.
    pub fn open(data_format: &DataFormat, path: &Path, field_widths: &[FieldWidth]) -> Result<Self> {
        let source_name = path.display().to_string();
        let file = File::create(path)?;
        match data_format.family() {
            DataFormatFamily::Delimited => Ok(RowWriter::Delimited(DelimitedWriter::new(data_format, &source_name, file)?)),
            DataFormatFamily::Fixed => Ok(RowWriter::Fixed(FixedWriter::new(data_format, &source_name, file, field_widths)?)),
            other => Err(unsupported_family("writing", other).with_location(Location::new(&source_name))),
        }
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        match self {
            RowWriter::Delimited(writer) => writer.write_row(row),
            RowWriter::Fixed(writer) => writer.write_row(row),
        }
    }

    pub fn close(self) -> Result<()> {
        match self {
            RowWriter::Delimited(writer) => writer.close(),
            RowWriter::Fixed(writer) => writer.close(),
        }
    }
}

fn encoder_for(data_format: &DataFormat, source_name: &str) -> Result<&'static Encoding> {
    Encoding::for_label(data_format.encoding().as_bytes()).ok_or_else(|| {
        CutplaceError::data_format(format!("unknown encoding {:?}", data_format.encoding()))
            .with_location(Location::new(source_name))
    })
}

pub struct DelimitedWriter {
    sink: BufWriter<File>,
    location: Location,
    encoding: &'static Encoding,
    item_delimiter: char,
    quote_character: Option<char>,
    escape_character: Option<char>,
    quoting: crate::data_format::QuotingMode,
    line_delimiter: &'static str,
}

impl DelimitedWriter {
    pub fn new(data_format: &DataFormat, source_name: &str, file: File) -> Result<Self> {
        Ok(DelimitedWriter {
            sink: BufWriter::new(file),
            location: Location::with_cell(source_name),
            encoding: encoder_for(data_format, source_name)?,
            item_delimiter: data_format.item_delimiter(),
            quote_character: data_format.quote_character(),
            escape_character: data_format.escape_character(),
            quoting: data_format.quoting(),
            line_delimiter: data_format.line_delimiter().unwrap_or(LineDelimiter::Lf).as_bytes(),
        })
    }

    fn needs_quoting(&self, field: &str) -> bool {
        match self.quoting {
            crate::data_format::QuotingMode::All => true,
            crate::data_format::QuotingMode::None => false,
            crate::data_format::QuotingMode::Minimal => {
                field.contains(self.item_delimiter)
                    || self.quote_character.is_some_and(|quote| field.contains(quote))
                    || field.contains('\n')
                    || field.contains('\r')
            }
        }
    }

    fn encode_field(&self, field: &str) -> String {
        if !self.needs_quoting(field) {
            return field.to_string();
        }
        let Some(quote_character) = self.quote_character else {
            return field.to_string();
        };
        let mut encoded = String::with_capacity(field.len() + 2);
        encoded.push(quote_character);
        let doubled_quote_escape = self.escape_character == Some(quote_character);
        for c in field.chars() {
            if c == quote_character {
                if doubled_quote_escape {
                    encoded.push(quote_character);
                } else if let Some(escape_character) = self.escape_character {
                    encoded.push(escape_character);
                }
            } else if let Some(escape_character) = self.escape_character {
                if c == escape_character && !doubled_quote_escape {
                    encoded.push(escape_character);
                }
            }
            encoded.push(c);
        }
        encoded.push(quote_character);
        encoded
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        let mut line = String::new();
        for (index, field) in row.iter().enumerate() {
            if index > 0 {
                line.push(self.item_delimiter);
            }
            line.push_str(&self.encode_field(field));
        }
        line.push_str(self.line_delimiter);

        let (bytes, _, had_errors) = self.encoding.encode(&line);
        if had_errors {
            return Err(CutplaceError::data_format(format!("row cannot be encoded as {}: {:?}", self.encoding.name(), row))
                .with_location(self.location.clone()));
        }
        self.sink.write_all(&bytes)?;
        self.location.advance_line(1);
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

pub struct FixedWriter {
    sink: BufWriter<File>,
    location: Location,
    encoding: &'static Encoding,
    field_widths: Vec<(String, usize)>,
    line_delimiter: LineDelimiter,
}

impl FixedWriter {
    pub fn new(data_format: &DataFormat, source_name: &str, file: File, field_widths: &[FieldWidth]) -> Result<Self> {
        Ok(FixedWriter {
            sink: BufWriter::new(file),
            location: Location::with_cell(source_name),
            encoding: encoder_for(data_format, source_name)?,
            field_widths: field_widths.to_vec(),
            line_delimiter: data_format.line_delimiter().unwrap_or(LineDelimiter::Any),
        })
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        let mut line = String::new();
        for (index, (field_name, width)) in self.field_widths.iter().enumerate() {
            let field = row.get(index).map(String::as_str).unwrap_or("");
            let length = field.chars().count();
            if length > *width {
                return Err(CutplaceError::data_format(format!(
                    "field {:?} is {} character(s) wider than its declared width of {}",
                    field_name,
                    length - width,
                    width
                ))
                .with_location(self.location.clone()));
            }
            line.push_str(field);
            for _ in length..*width {
                line.push(' ');
            }
        }
        line.push_str(match self.line_delimiter {
            LineDelimiter::None => "",
            LineDelimiter::Any => "\n",
            other => other.as_bytes(),
        });

        let (bytes, _, had_errors) = self.encoding.encode(&line);
        if had_errors {
            return Err(CutplaceError::data_format(format!("row cannot be encoded as {}: {:?}", self.encoding.name(), row))
                .with_location(self.location.clone()));
        }
        self.sink.write_all(&bytes)?;
        self.location.advance_line(1);
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}
