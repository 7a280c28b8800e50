//! Row reader for the `delimited` family: a hand-rolled, RFC 4180-flavored
//! parser configured entirely from the data format's properties (item
//! delimiter, quote/escape character, skip-initial-space, line delimiter).

use encoding_rs::Encoding;

use crate::data_format::DataFormat;
use crate::error::{CutplaceError, Location, Result};

pub struct DelimitedReader {
    chars: Vec<char>,
    position: usize,
    location: Location,
    item_delimiter: char,
    quote_character: Option<char>,
    escape_character: Option<char>,
    skip_initial_space: bool,
    exhausted: bool,
}

fn decode(bytes: &[u8], encoding_name: &str, source_name: &str) -> Result<String> {
    let encoding = Encoding::for_label(encoding_name.as_bytes()).ok_or_else(|| {
        CutplaceError::data_format(format!("unknown encoding {:?}", encoding_name)).with_location(Location::new(source_name))
    })?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(CutplaceError::data_format(format!("data is not valid {} text", encoding_name))
            .with_location(Location::new(source_name)));
    }
    Ok(text.into_owned())
}

impl DelimitedReader {
    pub fn new(data_format: &DataFormat, source_name: &str, bytes: &[u8]) -> Result<Self> {
        let text = decode(bytes, data_format.encoding(), source_name)?;
        Ok(DelimitedReader {
            chars: text.chars().collect(),
            position: 0,
            location: Location::with_cell(source_name),
            item_delimiter: data_format.item_delimiter(),
            quote_character: data_format.quote_character(),
            escape_character: data_format.escape_character(),
            skip_initial_space: data_format.skip_initial_space(),
            exhausted: false,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.peek();
        if next.is_some() {
            self.position += 1;
        }
        next
    }

    fn is_line_break(&self, c: char) -> bool {
        c == '\n' || c == '\r'
    }

    /// Consumes a line break starting at `c`, treating `\r\n` as one break.
    fn consume_line_break(&mut self, c: char) {
        if c == '\r' && self.peek() == Some('\n') {
            self.position += 1;
        }
    }

    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        if self.position >= self.chars.len() {
            return Ok(None);
        }

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut at_field_start = true;
        let doubled_quote_escape = self.escape_character.is_some() && self.escape_character == self.quote_character;

        loop {
            let Some(c) = self.advance() else {
                if in_quotes {
                    return Err(CutplaceError::data_format("quoted field is not terminated before the end of the data")
                        .with_location(self.location.clone()));
                }
                fields.push(field);
                return Ok(Some(fields));
            };

            if in_quotes {
                if Some(c) == self.quote_character {
                    if doubled_quote_escape && self.peek() == self.quote_character {
                        self.advance();
                        field.push(c);
                    } else {
                        in_quotes = false;
                    }
                } else if !doubled_quote_escape && Some(c) == self.escape_character {
                    if let Some(escaped) = self.advance() {
                        field.push(escaped);
                    }
                } else {
                    field.push(c);
                }
                continue;
            }

            if self.skip_initial_space && at_field_start && c == ' ' {
                continue;
            }

            if Some(c) == self.quote_character && at_field_start {
                in_quotes = true;
                at_field_start = false;
                continue;
            }

            if c == self.item_delimiter {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
                continue;
            }

            if self.is_line_break(c) {
                self.consume_line_break(c);
                fields.push(field);
                return Ok(Some(fields));
            }

            field.push(c);
            at_field_start = false;
        }
    }

}

impl Iterator for DelimitedReader {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read_record() {
            Ok(Some(fields)) => {
                self.location.advance_line(1);
                Some(Ok(fields))
            }
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(error) => {
                self.exhausted = true;
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
        let mut format = DataFormat::new(DataFormatFamily::Delimited);
        format.validate().unwrap();
        format
    }

    fn rows(text: &str) -> Vec<Vec<String>> {
        let format = format();
        let reader = DelimitedReader::new(&format, "test.csv", text.as_bytes()).unwrap();
        reader.collect::<Result<Vec<_>>>().unwrap().into_iter().collect()
    }

    fn read_rows(format: &DataFormat, text: &str) -> Result<Vec<Vec<String>>> {
        let reader = DelimitedReader::new(format, "test.csv", text.as_bytes())?;
        reader.collect()
    }

    #[test]
    fn splits_simple_rows() {
        let result = rows("branch,customer\n38000,23\n");
        assert_eq!(result, vec![vec!["branch", "customer"], vec!["38000", "23"]]);
    }

    #[test]
    fn handles_quoted_field_with_embedded_delimiter_and_newline() {
        let result = rows("\"a,b\",\"c\nd\"\n");
        assert_eq!(result, vec![vec!["a,b", "c\nd"]]);
    }

    #[test]
    fn doubled_quote_is_a_literal_quote() {
        let result = rows("\"say \"\"hi\"\"\",ok\n");
        assert_eq!(result, vec![vec!["say \"hi\"", "ok"]]);
    }

    #[test]
    fn last_row_without_trailing_newline_is_read() {
        let result = rows("a,b");
        assert_eq!(result, vec![vec!["a", "b"]]);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let result = rows("");
        assert!(result.is_empty());
    }

    #[test]
    fn unterminated_quote_is_a_data_format_error() {
        let format = format();
        let error = read_rows(&format, "\"a,b").unwrap_err();
        assert_eq!(error.kind, crate::error::ErrorKind::DataFormat);
    }
}
