//! ZIP archive helper for the OpenDocument Spreadsheet (ODS) row reader.

use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Looks a file up by name, case-insensitive and path-separator agnostic.
    fn file(&'_ mut self, name: &str) -> crate::error::Result<Option<ZipFile<'_, RS>>>;

    fn xml_reader(&'_ mut self, name: &str) -> crate::error::Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> crate::error::Result<Option<ZipFile<'_, RS>>> {
        let pattern = name.replace('\\', "/");
        let path = self
            .file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(file_name))
            .map(str::to_owned);
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(found) => Ok(found),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> crate::error::Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>> {
        Ok(self.file(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}
