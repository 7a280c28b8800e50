//! Row reader for the `fixed` family: records are sequences of
//! constant-width columns, optionally separated by a line delimiter.

use encoding_rs::Encoding;

use crate::data_format::{DataFormat, LineDelimiter};
use crate::error::{CutplaceError, Location, Result};
use crate::row::FieldWidth;

pub struct FixedReader {
    chars: Vec<char>,
    position: usize,
    location: Location,
    field_widths: Vec<(String, usize)>,
    record_width: usize,
    line_delimiter: LineDelimiter,
}

impl FixedReader {
    pub fn new(data_format: &DataFormat, source_name: &str, bytes: &[u8], field_widths: &[FieldWidth]) -> Result<Self> {
        let encoding_name = data_format.encoding();
        let encoding = Encoding::for_label(encoding_name.as_bytes()).ok_or_else(|| {
            CutplaceError::data_format(format!("unknown encoding {:?}", encoding_name))
                .with_location(Location::new(source_name))
        })?;
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(CutplaceError::data_format(format!("data is not valid {} text", encoding_name))
                .with_location(Location::new(source_name)));
        }
        let record_width = field_widths.iter().map(|(_, width)| *width).sum();
        Ok(FixedReader {
            chars: text.chars().collect(),
            position: 0,
            location: Location::with_cell(source_name),
            field_widths: field_widths.to_vec(),
            record_width,
            line_delimiter: data_format.line_delimiter().unwrap_or(LineDelimiter::Any),
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    fn remaining(&self) -> usize {
        self.chars.len() - self.position
    }

    fn at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn take(&mut self, count: usize) -> String {
        let text: String = self.chars[self.position..self.position + count].iter().collect();
        self.position += count;
        text
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Consumes the configured line delimiter after a record. A missing
    /// delimiter is only tolerated when it would have sat at the very end
    /// of the data (the last record need not be newline-terminated).
    fn consume_delimiter(&mut self) -> Result<()> {
        match self.line_delimiter {
            LineDelimiter::None => Ok(()),
            LineDelimiter::Lf => self.expect_literal("\n"),
            LineDelimiter::Cr => self.expect_literal("\r"),
            LineDelimiter::CrLf => self.expect_literal("\r\n"),
            LineDelimiter::Any => {
                match self.peek() {
                    Some('\r') => {
                        self.position += 1;
                        if self.peek() == Some('\n') {
                            self.position += 1;
                        }
                    }
                    Some('\n') => self.position += 1,
                    _ => {}
                }
                Ok(())
            }
        }
    }

    fn expect_literal(&mut self, delimiter: &str) -> Result<()> {
        if self.at_end() {
            return Ok(());
        }
        let chars: Vec<char> = delimiter.chars().collect();
        if self.remaining() >= chars.len() && self.chars[self.position..self.position + chars.len()] == chars[..] {
            self.position += chars.len();
            Ok(())
        } else {
            Err(CutplaceError::data_format(format!("line delimiter {:?} expected after record", delimiter))
                .with_location(self.location.clone()))
        }
    }

    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        if self.at_end() {
            return Ok(None);
        }

        let mut fields = Vec::with_capacity(self.field_widths.len());
        let mut consumed = 0;
        for (field_name, width) in self.field_widths.clone() {
            if self.remaining() < width {
                let missing = width - self.remaining();
                return Err(CutplaceError::data_format(format!(
                    "field {:?} is {} character(s) short of its declared width of {}",
                    field_name, missing, width
                ))
                .with_location(self.location.clone()));
            }
            fields.push(self.take(width));
            consumed += width;
        }
        debug_assert_eq!(consumed, self.record_width);
        self.consume_delimiter()?;
        Ok(Some(fields))
    }

}

impl Iterator for FixedReader {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(fields)) => {
                self.location.advance_line(1);
                Some(Ok(fields))
            }
            Ok(None) => None,
            Err(error) => {
                self.position = self.chars.len();
                Some(Err(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_format::DataFormatFamily;

    fn format() -> DataFormat {
        let mut format = DataFormat::new(DataFormatFamily::Fixed);
        format.validate().unwrap();
        format
    }

    fn widths() -> Vec<FieldWidth> {
        vec![("branch".to_string(), 5), ("customer".to_string(), 3)]
    }

    #[test]
    fn reads_records_separated_by_line_delimiter() {
        let format = format();
        let reader = FixedReader::new(&format, "test.txt", b"38000023\n38100045", &widths()).unwrap();
        let result: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(result, vec![vec!["38000", "023"], vec!["38100", "045"]]);
    }

    #[test]
    fn short_final_record_is_a_data_format_error() {
        let format = format();
        let mut reader = FixedReader::new(&format, "test.txt", b"38000012", &widths()).unwrap();
        let error = reader.next().unwrap().unwrap_err();
        assert_eq!(error.kind, crate::error::ErrorKind::DataFormat);
    }

    #[test]
    fn none_delimiter_reads_abutting_records() {
        let mut format = DataFormat::new(DataFormatFamily::Fixed);
        format.set_property("line delimiter", "none").unwrap();
        format.validate().unwrap();
        let reader = FixedReader::new(&format, "test.txt", b"3800002338100045", &widths()).unwrap();
        let result: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(result, vec![vec!["38000", "023"], vec!["38100", "045"]]);
    }
}
