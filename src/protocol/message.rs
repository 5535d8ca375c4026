//! IPC message envelope
//!
//! Layout:
//! ┌────────────┬──────────┬────────────┬──────────┬──────────────────────┐
//! │ endianness │ msg type │ compressed │ reserved │ total size (i32)     │
//! │ u8         │ u8       │ u8         │ u8       │ declared endianness  │
//! ├────────────┴──────────┴────────────┴──────────┴──────────────────────┤
//! │ Payload (size - 8 bytes, mungkin compressed)                         │
//! └──────────────────────────────────────────────────────────────────────┘

use super::endian::Endianness;
use crate::core::Value;
use crate::error::ReaderError;

pub const HEADER_SIZE: usize = 8;

/// Tipe pesan di byte kedua header
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Fire-and-forget
    Async = 0,
    /// Request yang menunggu response
    Sync = 1,
    Response = 2,
}

impl MessageType {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Async),
            1 => Some(Self::Sync),
            2 => Some(Self::Response),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Async => "async",
            Self::Sync => "sync",
            Self::Response => "response",
        })
    }
}

/// Parsed 8-byte header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub endianness: Endianness,
    pub kind: MessageType,
    pub compressed: bool,
    /// Total size termasuk header
    pub size: usize,
}

impl MessageHeader {
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self, ReaderError> {
        let endianness = Endianness::from_u8(bytes[0]);
        let kind = MessageType::from_u8(bytes[1])
            .ok_or_else(|| ReaderError::UnexpectedMessage(format!("message type {}", bytes[1])))?;
        Ok(Self {
            endianness,
            kind,
            compressed: bytes[2] == 1,
            size: Self::declared_size(bytes),
        })
    }

    /// Total size dari header, tanpa validasi field lain. Dipakai untuk
    /// drain payload walaupun header ditolak.
    pub fn declared_size(bytes: &[u8; HEADER_SIZE]) -> usize {
        let size_bytes = [bytes[4], bytes[5], bytes[6], bytes[7]];
        let size = match Endianness::from_u8(bytes[0]) {
            Endianness::Big => i32::from_be_bytes(size_bytes),
            Endianness::Little => i32::from_le_bytes(size_bytes),
        };
        size.max(0) as usize
    }

    /// Panjang payload di wire: max(size - 8, 0)
    #[inline(always)]
    pub fn payload_len(&self) -> usize {
        self.size.saturating_sub(HEADER_SIZE)
    }
}

/// Satu message yang sudah dibaca dari stream
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageType,
    pub endianness: Endianness,
    pub compressed: bool,
    /// True jika `data` berisi payload mentah (`Value::ByteList`)
    pub raw: bool,
    /// Total message size di wire, termasuk header
    pub size: usize,
    /// Ukuran payload setelah decompression
    pub data_size: usize,
    pub data: Value,
}

impl Message {
    /// Payload mentah untuk message yang dibaca dalam raw mode
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match (&self.data, self.raw) {
            (Value::ByteList(bytes), true) => Some(bytes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parse() {
        let h = MessageHeader::parse(&[1, 2, 0, 0, 0x11, 0, 0, 0]).unwrap();
        assert_eq!(h.endianness, Endianness::Little);
        assert_eq!(h.kind, MessageType::Response);
        assert!(!h.compressed);
        assert_eq!(h.size, 17);
        assert_eq!(h.payload_len(), 9);
    }

    #[test]
    fn test_header_big_endian() {
        let h = MessageHeader::parse(&[0, 0, 1, 0, 0, 0, 0, 0x20]).unwrap();
        assert_eq!(h.endianness, Endianness::Big);
        assert_eq!(h.kind, MessageType::Async);
        assert!(h.compressed);
        assert_eq!(h.payload_len(), 24);
    }

    #[test]
    fn test_unknown_kind_keeps_declared_size() {
        let bytes = [1, 5, 0, 0, 0x20, 0, 0, 0];
        assert!(matches!(
            MessageHeader::parse(&bytes),
            Err(ReaderError::UnexpectedMessage(_))
        ));
        assert_eq!(MessageHeader::declared_size(&bytes), 32);
    }

    #[test]
    fn test_short_size_has_empty_payload() {
        let h = MessageHeader::parse(&[1, 1, 0, 0, 4, 0, 0, 0]).unwrap();
        assert_eq!(h.payload_len(), 0);
        assert!(MessageHeader::parse(&[1, 9, 0, 0, 8, 0, 0, 0]).is_err());
    }
}
