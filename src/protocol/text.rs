//! Text encoding untuk string dan symbol

use std::borrow::Cow;

use crate::error::{ReaderError, WriterError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Satu byte per char (ISO-8859-1)
    Latin1,
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> Result<String, ReaderError> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| ReaderError::Text(e.to_string())),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Cow<'_, [u8]>, WriterError> {
        match self {
            TextEncoding::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            TextEncoding::Latin1 if text.is_ascii() => Ok(Cow::Borrowed(text.as_bytes())),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c as u32).map_err(|_| WriterError::Text(text.to_string())))
                .collect::<Result<Vec<u8>, _>>()
                .map(Cow::Owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1() {
        let bytes = TextEncoding::Latin1.encode("café").unwrap();
        assert_eq!(bytes.as_ref(), b"caf\xe9");
        assert_eq!(TextEncoding::Latin1.decode(&bytes).unwrap(), "café");
        assert!(TextEncoding::Latin1.encode("€").is_err());
    }

    #[test]
    fn test_utf8() {
        assert_eq!(TextEncoding::Utf8.encode("café").unwrap().len(), 5);
        assert!(TextEncoding::Utf8.decode(b"\xff").is_err());
    }
}
