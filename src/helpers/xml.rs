//! XML parsing utilities for the OpenDocument Spreadsheet (ODS) row reader.
//! Provides an XML reader wrapper and helper traits for attribute/text
//! processing.

use crate::error::CutplaceError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum XmlError {
    #[error("could not resolve entity {0:?}")]
    ParseEntityError(String),
}

/// XML reader wrapper with configuration tuned for spreadsheet parsing.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    pub(crate) fn next(&'_ mut self) -> crate::error::Result<Option<Event<'_>>> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(error.into()),
        }
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    fn get_value(&self) -> crate::error::Result<Cow<'a, str>>;
    fn parse_value<T: FromStr>(&self) -> crate::error::Result<T>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> crate::error::Result<Cow<'a, str>> {
        Ok(self.unescape_value()?)
    }

    fn parse_value<T: FromStr>(&self) -> crate::error::Result<T> {
        self.get_value()?.parse().map_err(|_| {
            CutplaceError::data_format(format!(
                "could not parse attribute value as the expected type: {:?}",
                String::from_utf8_lossy(&self.value)
            ))
        })
    }
}

pub(crate) trait XmlNodeHelper<'a> {
    fn get_attribute_value(&'a self, name: &str) -> crate::error::Result<Option<Cow<'a, str>>>;
    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> crate::error::Result<Option<T>>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> crate::error::Result<Option<Cow<'a, str>>> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> crate::error::Result<Option<T>> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.parse_value())
            .transpose()
    }
}

pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> crate::error::Result<()>;
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> crate::error::Result<()>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> crate::error::Result<()> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> crate::error::Result<()> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)
            } else {
                number.parse::<u32>()
            }
            .map_err(|_| XmlError::ParseEntityError(raw.to_string()))?;
            if let Some(character) = std::char::from_u32(code) {
                self.push_str(character.encode_utf8(&mut [0u8; 4]));
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            return Err(CutplaceError::data_format(format!(
                "could not resolve XML entity: {:?}",
                raw
            )));
        }
        Ok(())
    }
}

impl From<XmlError> for CutplaceError {
    fn from(error: XmlError) -> Self {
        CutplaceError::data_format(error.to_string()).with_cause(error)
    }
}
