//! Endian-aware primitive reader
//!
//! Cursor di atas fixed byte buffer. Byte order hanya mempengaruhi
//! multi-byte integer (dan float yang di-reinterpret dari integer bits).
//! Semua read bounds-checked: buffer pendek = `ReaderError::UnexpectedEof`.

use std::io::SeekFrom;

use uuid::Uuid;

use super::text::TextEncoding;
use crate::error::ReaderError;

/// Byte order yang dideklarasikan di byte pertama header
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big = 0,
    Little = 1,
}

impl Endianness {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Self {
        if v == 0 {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// Wire byte j -> canonical byte GUID_ORDER[j]
pub(crate) const GUID_ORDER: [usize; 16] = [3, 2, 1, 0, 5, 4, 7, 6, 8, 9, 10, 11, 12, 13, 14, 15];

pub struct EndianReader<'a> {
    buffer: &'a [u8],
    position: usize,
    endianness: Endianness,
}

impl<'a> EndianReader<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a [u8], endianness: Endianness) -> Self {
        Self {
            buffer,
            position: 0,
            endianness,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    #[inline(always)]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    #[inline(always)]
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Pindahkan cursor relatif ke start/end/current. Posisi diluar
    /// `[0, len]` ditolak.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<usize, ReaderError> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::End(offset) => self.buffer.len() as i128 + i128::from(offset),
            SeekFrom::Current(offset) => self.position as i128 + i128::from(offset),
        };
        if target < 0 || target > self.buffer.len() as i128 {
            return Err(ReaderError::UnexpectedEof {
                offset: self.position,
                needed: 0,
                available: self.remaining(),
            });
        }
        self.position = target as usize;
        Ok(self.position)
    }

    /// Ambil `n` bytes mentah dan majukan cursor (zero-copy)
    #[inline(always)]
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        if n > self.remaining() {
            return Err(ReaderError::UnexpectedEof {
                offset: self.position,
                needed: n,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += n;
        Ok(&self.buffer[start..self.position])
    }

    #[inline(always)]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReaderError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.read_bytes(1)?[0])
    }

    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8, ReaderError> {
        Ok(self.read_u8()? as i8)
    }

    #[inline(always)]
    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        Ok(self.read_u8()? != 0)
    }

    /// Single byte char (Latin-1 mapping)
    #[inline(always)]
    pub fn read_char(&mut self) -> Result<char, ReaderError> {
        Ok(self.read_u8()? as char)
    }

    #[inline(always)]
    pub fn read_i16(&mut self) -> Result<i16, ReaderError> {
        let b = self.read_array::<2>()?;
        Ok(match self.endianness {
            Endianness::Big => i16::from_be_bytes(b),
            Endianness::Little => i16::from_le_bytes(b),
        })
    }

    #[inline(always)]
    pub fn read_i32(&mut self) -> Result<i32, ReaderError> {
        let b = self.read_array::<4>()?;
        Ok(match self.endianness {
            Endianness::Big => i32::from_be_bytes(b),
            Endianness::Little => i32::from_le_bytes(b),
        })
    }

    #[inline(always)]
    pub fn read_i64(&mut self) -> Result<i64, ReaderError> {
        let b = self.read_array::<8>()?;
        Ok(match self.endianness {
            Endianness::Big => i64::from_be_bytes(b),
            Endianness::Little => i64::from_le_bytes(b),
        })
    }

    #[inline(always)]
    pub fn read_f32(&mut self) -> Result<f32, ReaderError> {
        Ok(f32::from_bits(self.read_i32()? as u32))
    }

    #[inline(always)]
    pub fn read_f64(&mut self) -> Result<f64, ReaderError> {
        Ok(f64::from_bits(self.read_i64()? as u64))
    }

    /// 16-byte identifier; permutasi membuat urutan wire == urutan canonical
    pub fn read_guid(&mut self) -> Result<Uuid, ReaderError> {
        let wire = self.read_array::<16>()?;
        let mut bytes = [0u8; 16];
        for (j, b) in wire.iter().enumerate() {
            bytes[GUID_ORDER[j]] = *b;
        }
        Ok(Uuid::from_bytes_le(bytes))
    }

    /// Fixed-length string
    pub fn read_string(&mut self, len: usize, encoding: TextEncoding) -> Result<String, ReaderError> {
        encoding.decode(self.read_bytes(len)?)
    }

    /// NUL-terminated symbol; cursor maju melewati terminator
    pub fn read_symbol(&mut self, encoding: TextEncoding) -> Result<String, ReaderError> {
        let rest = &self.buffer[self.position..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ReaderError::UnexpectedEof {
                offset: self.position,
                needed: rest.len() + 1,
                available: rest.len(),
            })?;
        let text = encoding.decode(&rest[..end])?;
        self.position += end + 1;
        Ok(text)
    }
}
