//! Text field format: accepts any text; rule is ignored.

use super::{FieldFormatHeader, FieldValue};

#[derive(Clone, Debug)]
pub struct TextFieldFormat {
    pub header: FieldFormatHeader,
}

impl TextFieldFormat {
    pub fn new(header: FieldFormatHeader) -> crate::error::Result<Self> {
        Ok(TextFieldFormat { header })
    }

    pub fn validated_value(&self, text: &str) -> crate::error::Result<FieldValue> {
        Ok(FieldValue::Text(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_text_unchanged() {
        let header = FieldFormatHeader::new("name", false, "", "").unwrap();
        let format = TextFieldFormat::new(header).unwrap();
        assert_eq!(format.validated_value("hello").unwrap(), FieldValue::Text("hello".to_string()));
    }
}
