//! Recursive value decoder
//!
//! Single pass, tanpa backtracking: baca satu type tag lalu dispatch.
//! Error tag tidak pernah menghasilkan value; selalu di-raise sebagai
//! `ReaderError::Remote`.

use super::endian::{EndianReader, Endianness};
use super::qtype::QType;
use super::text::TextEncoding;
use crate::core::{
    Date, Datetime, Dictionary, Function, KeyedTable, Lambda, Minute, Month, Projection, Second,
    Table, Time, Timespan, Timestamp, Value,
};
use crate::error::{ModelError, ReaderError};

/// Decoder di atas satu payload (sudah di-decompress)
pub struct Decoder<'a> {
    reader: EndianReader<'a>,
    encoding: TextEncoding,
}

impl<'a> Decoder<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a [u8], endianness: Endianness, encoding: TextEncoding) -> Self {
        Self {
            reader: EndianReader::new(buffer, endianness),
            encoding,
        }
    }

    /// Posisi cursor dalam payload
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Decode satu value (rekursif untuk lists, dictionaries, tables)
    pub fn read_object(&mut self) -> Result<Value, ReaderError> {
        let tag = self.reader.read_i8()?;
        let qtype = QType::from_tag(tag)?;

        match qtype {
            QType::Error => Err(ReaderError::Remote(self.reader.read_symbol(self.encoding)?)),
            QType::GeneralList => self.read_general_list(),
            t if t.is_atom() => self.read_atom(t),
            t if t.is_vector() => self.read_vector(t),
            QType::Table => self.read_table().map(Value::Table),
            QType::Dictionary => self.read_dictionary(),
            QType::Lambda => self.read_lambda(),
            QType::Projection => {
                let count = self.read_len()?;
                let mut parameters = Vec::with_capacity(count.min(self.reader.remaining()));
                for _ in 0..count {
                    parameters.push(self.read_object()?);
                }
                Ok(Value::Function(Projection::new(parameters).into()))
            }
            QType::UnaryPrimitive => {
                if self.reader.read_u8()? == 0 {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Function(Function::Primitive(tag)))
                }
            }
            QType::BinaryPrimitive | QType::TernaryOperator => {
                self.reader.read_u8()?;
                Ok(Value::Function(Function::Primitive(tag)))
            }
            QType::Composition => {
                let count = self.read_len()?;
                for _ in 0..count {
                    self.read_object()?;
                }
                Ok(Value::Function(Function::Primitive(tag)))
            }
            QType::Each
            | QType::Over
            | QType::Scan
            | QType::EachPrior
            | QType::EachRight
            | QType::EachLeft => {
                self.read_object()?;
                Ok(Value::Function(Function::Primitive(tag)))
            }
            other => Err(ReaderError::UnsupportedType(other)),
        }
    }

    /// i32 length prefix; negatif ditolak
    #[inline(always)]
    fn read_len(&mut self) -> Result<usize, ReaderError> {
        let len = self.reader.read_i32()?;
        usize::try_from(len).map_err(|_| ReaderError::InvalidLength(len))
    }

    /// Baca `len` element; capacity dibatasi sisa buffer
    #[inline(always)]
    fn collect<T>(
        &mut self,
        len: usize,
        mut read: impl FnMut(&mut EndianReader<'a>) -> Result<T, ReaderError>,
    ) -> Result<Vec<T>, ReaderError> {
        let mut out = Vec::with_capacity(len.min(self.reader.remaining()));
        for _ in 0..len {
            out.push(read(&mut self.reader)?);
        }
        Ok(out)
    }

    fn read_atom(&mut self, qtype: QType) -> Result<Value, ReaderError> {
        let r = &mut self.reader;
        Ok(match qtype {
            QType::Bool => Value::Bool(r.read_bool()?),
            QType::Guid => Value::Guid(r.read_guid()?),
            QType::Byte => Value::Byte(r.read_u8()?),
            QType::Short => Value::Short(r.read_i16()?),
            QType::Int => Value::Int(r.read_i32()?),
            QType::Long => Value::Long(r.read_i64()?),
            QType::Real => Value::Real(r.read_f32()?),
            QType::Float => Value::Float(r.read_f64()?),
            QType::Char => Value::Char(r.read_char()?),
            QType::Symbol => Value::Symbol(r.read_symbol(self.encoding)?),
            QType::Timestamp => Value::Timestamp(Timestamp::new(r.read_i64()?)),
            QType::Month => Value::Month(Month::new(r.read_i32()?)),
            QType::Date => Value::Date(Date::new(r.read_i32()?)),
            QType::Datetime => Value::Datetime(Datetime::new(r.read_f64()?)),
            QType::Timespan => Value::Timespan(Timespan::new(r.read_i64()?)),
            QType::Minute => Value::Minute(Minute::new(r.read_i32()?)),
            QType::Second => Value::Second(Second::new(r.read_i32()?)),
            QType::Time => Value::Time(Time::new(r.read_i32()?)),
            other => return Err(ReaderError::UnsupportedType(other)),
        })
    }

    fn read_vector(&mut self, qtype: QType) -> Result<Value, ReaderError> {
        self.reader.read_u8()?; // attributes
        let len = self.read_len()?;
        let encoding = self.encoding;

        Ok(match qtype {
            QType::BoolList => Value::BoolList(self.collect(len, |r| r.read_bool())?),
            QType::GuidList => Value::GuidList(self.collect(len, |r| r.read_guid())?),
            QType::ByteList => Value::ByteList(self.reader.read_bytes(len)?.to_vec()),
            QType::ShortList => Value::ShortList(self.collect(len, |r| r.read_i16())?),
            QType::IntList => Value::IntList(self.collect(len, |r| r.read_i32())?),
            QType::LongList => Value::LongList(self.collect(len, |r| r.read_i64())?),
            QType::RealList => Value::RealList(self.collect(len, |r| r.read_f32())?),
            QType::FloatList => Value::FloatList(self.collect(len, |r| r.read_f64())?),
            QType::String => Value::String(self.reader.read_string(len, encoding)?),
            QType::SymbolList => {
                Value::SymbolList(self.collect(len, |r| r.read_symbol(encoding))?)
            }
            QType::TimestampList => {
                Value::TimestampList(self.collect(len, |r| r.read_i64().map(Timestamp::new))?)
            }
            QType::MonthList => Value::MonthList(self.collect(len, |r| r.read_i32().map(Month::new))?),
            QType::DateList => Value::DateList(self.collect(len, |r| r.read_i32().map(Date::new))?),
            QType::DatetimeList => {
                Value::DatetimeList(self.collect(len, |r| r.read_f64().map(Datetime::new))?)
            }
            QType::TimespanList => {
                Value::TimespanList(self.collect(len, |r| r.read_i64().map(Timespan::new))?)
            }
            QType::MinuteList => {
                Value::MinuteList(self.collect(len, |r| r.read_i32().map(Minute::new))?)
            }
            QType::SecondList => {
                Value::SecondList(self.collect(len, |r| r.read_i32().map(Second::new))?)
            }
            QType::TimeList => Value::TimeList(self.collect(len, |r| r.read_i32().map(Time::new))?),
            other => return Err(ReaderError::UnsupportedType(other)),
        })
    }

    fn read_general_list(&mut self) -> Result<Value, ReaderError> {
        self.reader.read_u8()?; // attributes
        let len = self.read_len()?;
        let mut items = Vec::with_capacity(len.min(self.reader.remaining()));
        for _ in 0..len {
            items.push(self.read_object()?);
        }
        Ok(Value::List(items))
    }

    /// Tag 99 dipakai dictionary dan keyed table; shape payload yang menentukan
    fn read_dictionary(&mut self) -> Result<Value, ReaderError> {
        let keys = self.read_object()?;
        let values = self.read_object()?;

        match (keys, values) {
            (Value::Table(k), Value::Table(v)) => Ok(KeyedTable::new(k, v)?.into()),
            (k, v) if k.is_array() && (v.is_array() || matches!(v, Value::Table(_))) => {
                Ok(Dictionary::new(k, v)?.into())
            }
            (k, v) => Err(ReaderError::DictionaryShape {
                keys: QType::of(&k)?,
                values: QType::of(&v)?,
            }),
        }
    }

    fn read_table(&mut self) -> Result<Table, ReaderError> {
        self.reader.read_u8()?; // attributes
        self.reader.read_i8()?; // dictionary marker
        let columns = match self.read_object()? {
            Value::SymbolList(columns) => columns,
            _ => return Err(ModelError::TableColumns.into()),
        };
        let data = match self.read_object()? {
            Value::List(data) => data,
            _ => return Err(ModelError::TableData.into()),
        };
        Ok(Table::new(columns, data)?)
    }

    fn read_lambda(&mut self) -> Result<Value, ReaderError> {
        self.reader.read_symbol(self.encoding)?; // context
        match self.read_object()? {
            Value::String(body) => Ok(Value::Function(Lambda::new(&body)?.into())),
            other => Err(ModelError::InvalidLambda(other.to_string()).into()),
        }
    }
}
