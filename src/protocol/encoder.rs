//! Message encoder
//!
//! Serialisasi value ke buffer internal, lalu patch total size di header.
//! Buffer dipakai ulang antar message; tidak ada byte yang menyentuh
//! transport sebelum seluruh message selesai dibangun.

use uuid::Uuid;

use super::endian::GUID_ORDER;
use super::message::{MessageType, HEADER_SIZE};
use super::qtype::QType;
use super::text::TextEncoding;
use crate::core::{Function, Table, Value};
use crate::error::WriterError;

const INITIAL_CAPACITY: usize = 64 * 1024;

/// Highest protocol version yang dipahami client
pub const MAX_PROTOCOL_VERSION: u8 = 3;

pub struct Encoder {
    buffer: Vec<u8>,
    protocol_version: u8,
    encoding: TextEncoding,
}

impl Encoder {
    pub fn new(protocol_version: u8, encoding: TextEncoding) -> Self {
        Self {
            buffer: Vec::with_capacity(INITIAL_CAPACITY),
            protocol_version,
            encoding,
        }
    }

    #[inline(always)]
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    #[inline(always)]
    pub fn set_protocol_version(&mut self, version: u8) {
        self.protocol_version = version;
    }

    /// Reset encoder untuk reuse
    #[inline(always)]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Encode satu message lengkap (header + payload).
    ///
    /// Header selalu little-endian: `[1, kind, 0, 0, size]`.
    pub fn encode(&mut self, value: &Value, kind: MessageType) -> Result<&[u8], WriterError> {
        self.buffer.clear();
        self.buffer.extend_from_slice(&[1, kind as u8, 0, 0, 0, 0, 0, 0]);

        if let Err(e) = self.write_object(value) {
            self.buffer.clear();
            return Err(e);
        }

        let total = self.buffer.len();
        let size = i32::try_from(total).map_err(|_| WriterError::MessageTooLarge(total))?;
        self.buffer[4..HEADER_SIZE].copy_from_slice(&size.to_le_bytes());

        Ok(&self.buffer)
    }

    /// Current buffer content
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[inline(always)]
    fn check_version(&self, qtype: QType) -> Result<(), WriterError> {
        let required = qtype.min_protocol_version();
        if self.protocol_version < required {
            return Err(WriterError::ProtocolVersion {
                qtype,
                required,
                negotiated: self.protocol_version,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn put_u8(&mut self, v: u8) {
        self.buffer.push(v);
    }

    #[inline(always)]
    fn put_tag(&mut self, qtype: QType) {
        self.buffer.push(qtype.tag() as u8);
    }

    #[inline(always)]
    fn put_i16(&mut self, v: i16) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    fn put_i32(&mut self, v: i32) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    fn put_i64(&mut self, v: i64) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    fn put_f32(&mut self, v: f32) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    fn put_f64(&mut self, v: f64) {
        self.buffer.extend_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    fn put_len(&mut self, len: usize) -> Result<(), WriterError> {
        let len = i32::try_from(len).map_err(|_| WriterError::MessageTooLarge(len))?;
        self.put_i32(len);
        Ok(())
    }

    /// Kebalikan dari permutasi saat read
    fn put_guid(&mut self, guid: &Uuid) {
        let bytes = guid.to_bytes_le();
        for &i in GUID_ORDER.iter() {
            self.buffer.push(bytes[i]);
        }
    }

    fn put_char(&mut self, c: char) -> Result<(), WriterError> {
        let byte = u8::try_from(c as u32).map_err(|_| WriterError::CharOutOfRange(c))?;
        self.buffer.push(byte);
        Ok(())
    }

    /// Text bytes + NUL terminator, tanpa length prefix
    fn put_symbol(&mut self, text: &str) -> Result<(), WriterError> {
        let bytes = self.encoding.encode(text)?;
        self.buffer.extend_from_slice(&bytes);
        self.buffer.push(0);
        Ok(())
    }

    /// Char vector: tag, attribute, byte length setelah encoding, bytes
    fn put_string(&mut self, text: &str) -> Result<(), WriterError> {
        let encoding = self.encoding;
        let bytes = encoding.encode(text)?;
        self.put_tag(QType::String);
        self.put_u8(0);
        self.put_len(bytes.len())?;
        self.buffer.extend_from_slice(&bytes);
        Ok(())
    }

    #[inline(always)]
    fn put_vector_header(&mut self, qtype: QType, len: usize) -> Result<(), WriterError> {
        self.put_tag(qtype);
        self.put_u8(0);
        self.put_len(len)
    }

    fn write_object(&mut self, value: &Value) -> Result<(), WriterError> {
        let qtype = QType::of(value)?;
        self.check_version(qtype)?;

        match value {
            Value::Null => {
                self.put_tag(QType::NULL_ITEM);
                self.put_u8(0);
            }
            Value::Bool(b) => {
                self.put_tag(qtype);
                self.put_u8(*b as u8);
            }
            Value::Guid(g) => {
                self.put_tag(qtype);
                self.put_guid(g);
            }
            Value::Byte(b) => {
                self.put_tag(qtype);
                self.put_u8(*b);
            }
            Value::Short(v) => {
                self.put_tag(qtype);
                self.put_i16(*v);
            }
            Value::Int(v) => {
                self.put_tag(qtype);
                self.put_i32(*v);
            }
            Value::Long(v) => {
                self.put_tag(qtype);
                self.put_i64(*v);
            }
            Value::Real(v) => {
                self.put_tag(qtype);
                self.put_f32(*v);
            }
            Value::Float(v) => {
                self.put_tag(qtype);
                self.put_f64(*v);
            }
            Value::Char(c) => {
                self.put_tag(qtype);
                self.put_char(*c)?;
            }
            Value::Symbol(s) => {
                self.put_tag(qtype);
                self.put_symbol(s)?;
            }
            Value::Timestamp(t) => {
                self.put_tag(qtype);
                self.put_i64(t.value());
            }
            Value::Month(t) => {
                self.put_tag(qtype);
                self.put_i32(t.value());
            }
            Value::Date(t) => {
                self.put_tag(qtype);
                self.put_i32(t.value());
            }
            Value::Datetime(t) => {
                self.put_tag(qtype);
                self.put_f64(t.value());
            }
            Value::Timespan(t) => {
                self.put_tag(qtype);
                self.put_i64(t.value());
            }
            Value::Minute(t) => {
                self.put_tag(qtype);
                self.put_i32(t.value());
            }
            Value::Second(t) => {
                self.put_tag(qtype);
                self.put_i32(t.value());
            }
            Value::Time(t) => {
                self.put_tag(qtype);
                self.put_i32(t.value());
            }

            Value::List(items) => {
                self.put_vector_header(qtype, items.len())?;
                for item in items {
                    self.write_object(item)?;
                }
            }
            Value::BoolList(v) => {
                self.put_vector_header(qtype, v.len())?;
                self.buffer.extend(v.iter().map(|&b| b as u8));
            }
            Value::GuidList(v) => {
                self.put_vector_header(qtype, v.len())?;
                for g in v {
                    self.put_guid(g);
                }
            }
            Value::ByteList(v) => {
                self.put_vector_header(qtype, v.len())?;
                self.buffer.extend_from_slice(v);
            }
            Value::ShortList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|&x| self.put_i16(x));
            }
            Value::IntList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|&x| self.put_i32(x));
            }
            Value::LongList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|&x| self.put_i64(x));
            }
            Value::RealList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|&x| self.put_f32(x));
            }
            Value::FloatList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|&x| self.put_f64(x));
            }
            Value::String(s) => self.put_string(s)?,
            Value::SymbolList(v) => {
                self.put_vector_header(qtype, v.len())?;
                for s in v {
                    self.put_symbol(s)?;
                }
            }
            Value::TimestampList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_i64(t.value()));
            }
            Value::MonthList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_i32(t.value()));
            }
            Value::DateList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_i32(t.value()));
            }
            Value::DatetimeList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_f64(t.value()));
            }
            Value::TimespanList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_i64(t.value()));
            }
            Value::MinuteList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_i32(t.value()));
            }
            Value::SecondList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_i32(t.value()));
            }
            Value::TimeList(v) => {
                self.put_vector_header(qtype, v.len())?;
                v.iter().for_each(|t| self.put_i32(t.value()));
            }

            Value::Error(message) => {
                self.put_tag(qtype);
                self.put_symbol(message)?;
            }
            Value::Dictionary(d) => {
                self.put_tag(qtype);
                self.write_object(d.keys())?;
                self.write_object(d.values())?;
            }
            Value::KeyedTable(kt) => {
                self.put_tag(QType::KEYED_TABLE);
                self.write_table(kt.keys())?;
                self.write_table(kt.values())?;
            }
            Value::Table(t) => self.write_table(t)?,

            Value::Function(Function::Lambda(lambda)) => {
                self.put_tag(qtype);
                self.put_u8(0); // context
                self.put_string(lambda.expression())?;
            }
            Value::Function(Function::Projection(projection)) => {
                self.put_tag(QType::LAMBDA_PART);
                self.put_len(projection.parameters().len())?;
                for p in projection.parameters() {
                    self.write_object(p)?;
                }
            }
            Value::Function(Function::Primitive(_)) => {
                return Err(WriterError::UnsupportedType(qtype));
            }
        }
        Ok(())
    }

    /// `[98][attr][99][column symbols][data general list]`
    fn write_table(&mut self, table: &Table) -> Result<(), WriterError> {
        self.put_tag(QType::Table);
        self.put_u8(0);
        self.put_tag(QType::Dictionary);

        self.put_vector_header(QType::SymbolList, table.columns_count())?;
        for column in table.columns() {
            self.put_symbol(column)?;
        }

        self.put_vector_header(QType::GeneralList, table.columns_count())?;
        for column in table.data() {
            self.write_object(column)?;
        }
        Ok(())
    }
}
