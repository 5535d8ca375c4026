//! Type registry: wire tag <-> value shape
//!
//! Tag negatif = atom, positif = vector, plus kode khusus untuk
//! table, dictionary, functions dan error.

use uuid::Uuid;

use crate::core::{Date, Datetime, Function, Minute, Month, Second, Time, Timespan, Timestamp, Value};
use crate::error::TypeError;

#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QType {
    Error = -128,

    Time = -19,
    Second = -18,
    Minute = -17,
    Timespan = -16,
    Datetime = -15,
    Date = -14,
    Month = -13,
    Timestamp = -12,
    Symbol = -11,
    Char = -10,
    Float = -9,
    Real = -8,
    Long = -7,
    Int = -6,
    Short = -5,
    Byte = -4,
    Guid = -2,
    Bool = -1,

    GeneralList = 0,
    BoolList = 1,
    GuidList = 2,
    ByteList = 4,
    ShortList = 5,
    IntList = 6,
    LongList = 7,
    RealList = 8,
    FloatList = 9,
    String = 10,
    SymbolList = 11,
    TimestampList = 12,
    MonthList = 13,
    DateList = 14,
    DatetimeList = 15,
    TimespanList = 16,
    MinuteList = 17,
    SecondList = 18,
    TimeList = 19,

    Table = 98,
    /// Dipakai juga oleh keyed table; dibedakan dari shape payload
    Dictionary = 99,
    Lambda = 100,
    /// Unary primitive; dengan payload byte 0 berarti generic null `::`
    UnaryPrimitive = 101,
    BinaryPrimitive = 102,
    TernaryOperator = 103,
    Projection = 104,
    Composition = 105,
    Each = 106,
    Over = 107,
    Scan = 108,
    EachPrior = 109,
    EachRight = 110,
    EachLeft = 111,
}

impl QType {
    /// Generic null ditulis sebagai unary primitive dengan payload 0
    pub const NULL_ITEM: QType = QType::UnaryPrimitive;
    pub const KEYED_TABLE: QType = QType::Dictionary;
    /// Projection adalah "lambda part" di wire
    pub const LAMBDA_PART: QType = QType::Projection;

    #[inline(always)]
    pub const fn tag(self) -> i8 {
        self as i8
    }

    pub fn from_tag(tag: i8) -> Result<Self, TypeError> {
        use QType::*;
        Ok(match tag {
            -128 => Error,
            -19 => Time,
            -18 => Second,
            -17 => Minute,
            -16 => Timespan,
            -15 => Datetime,
            -14 => Date,
            -13 => Month,
            -12 => Timestamp,
            -11 => Symbol,
            -10 => Char,
            -9 => Float,
            -8 => Real,
            -7 => Long,
            -6 => Int,
            -5 => Short,
            -4 => Byte,
            -2 => Guid,
            -1 => Bool,
            0 => GeneralList,
            1 => BoolList,
            2 => GuidList,
            4 => ByteList,
            5 => ShortList,
            6 => IntList,
            7 => LongList,
            8 => RealList,
            9 => FloatList,
            10 => String,
            11 => SymbolList,
            12 => TimestampList,
            13 => MonthList,
            14 => DateList,
            15 => DatetimeList,
            16 => TimespanList,
            17 => MinuteList,
            18 => SecondList,
            19 => TimeList,
            98 => Table,
            99 => Dictionary,
            100 => Lambda,
            101 => UnaryPrimitive,
            102 => BinaryPrimitive,
            103 => TernaryOperator,
            104 => Projection,
            105 => Composition,
            106 => Each,
            107 => Over,
            108 => Scan,
            109 => EachPrior,
            110 => EachRight,
            111 => EachLeft,
            other => return Err(TypeError::UnmappedTag(other)),
        })
    }

    /// Wire type untuk sebuah value
    pub fn of(value: &Value) -> Result<Self, TypeError> {
        use QType as Q;
        Ok(match value {
            Value::Null => Q::NULL_ITEM,
            Value::Bool(_) => Q::Bool,
            Value::Guid(_) => Q::Guid,
            Value::Byte(_) => Q::Byte,
            Value::Short(_) => Q::Short,
            Value::Int(_) => Q::Int,
            Value::Long(_) => Q::Long,
            Value::Real(_) => Q::Real,
            Value::Float(_) => Q::Float,
            Value::Char(_) => Q::Char,
            Value::Symbol(_) => Q::Symbol,
            Value::Timestamp(_) => Q::Timestamp,
            Value::Month(_) => Q::Month,
            Value::Date(_) => Q::Date,
            Value::Datetime(_) => Q::Datetime,
            Value::Timespan(_) => Q::Timespan,
            Value::Minute(_) => Q::Minute,
            Value::Second(_) => Q::Second,
            Value::Time(_) => Q::Time,
            Value::List(_) => Q::GeneralList,
            Value::BoolList(_) => Q::BoolList,
            Value::GuidList(_) => Q::GuidList,
            Value::ByteList(_) => Q::ByteList,
            Value::ShortList(_) => Q::ShortList,
            Value::IntList(_) => Q::IntList,
            Value::LongList(_) => Q::LongList,
            Value::RealList(_) => Q::RealList,
            Value::FloatList(_) => Q::FloatList,
            Value::String(_) => Q::String,
            Value::SymbolList(_) => Q::SymbolList,
            Value::TimestampList(_) => Q::TimestampList,
            Value::MonthList(_) => Q::MonthList,
            Value::DateList(_) => Q::DateList,
            Value::DatetimeList(_) => Q::DatetimeList,
            Value::TimespanList(_) => Q::TimespanList,
            Value::MinuteList(_) => Q::MinuteList,
            Value::SecondList(_) => Q::SecondList,
            Value::TimeList(_) => Q::TimeList,
            Value::Error(_) => Q::Error,
            Value::Dictionary(_) => Q::Dictionary,
            Value::Table(_) => Q::Table,
            Value::KeyedTable(_) => Q::KEYED_TABLE,
            Value::Function(Function::Lambda(_)) => Q::Lambda,
            Value::Function(Function::Projection(_)) => Q::LAMBDA_PART,
            Value::Function(Function::Primitive(tag)) => Q::from_tag(*tag)
                .map_err(|_| TypeError::UnmappedShape(format!("function marker {tag}")))?,
        })
    }

    #[inline(always)]
    pub fn is_atom(self) -> bool {
        (-19..0).contains(&self.tag())
    }

    #[inline(always)]
    pub fn is_vector(self) -> bool {
        (0..=19).contains(&self.tag())
    }

    /// Atom type dari element sebuah typed vector
    pub fn element_type(self) -> Option<QType> {
        if self.is_vector() && self != QType::GeneralList {
            QType::from_tag(-self.tag()).ok()
        } else {
            None
        }
    }

    /// Versi protocol minimum agar type ini boleh ditulis
    pub fn min_protocol_version(self) -> u8 {
        match self {
            QType::Guid | QType::GuidList => 3,
            QType::Timestamp | QType::TimestampList | QType::Timespan | QType::TimespanList => 1,
            _ => 0,
        }
    }
}

/// Null sentinel untuk atom type
pub fn null_of(qtype: QType) -> Result<Value, TypeError> {
    Ok(match qtype {
        QType::Bool => Value::Bool(false),
        QType::Guid => Value::Guid(Uuid::nil()),
        QType::Byte => Value::Byte(0),
        QType::Short => Value::Short(i16::MIN),
        QType::Int => Value::Int(i32::MIN),
        QType::Long => Value::Long(i64::MIN),
        QType::Real => Value::Real(f32::NAN),
        QType::Float => Value::Float(f64::NAN),
        QType::Char => Value::Char(' '),
        QType::Symbol => Value::Symbol(String::new()),
        QType::Timestamp => Value::Timestamp(Timestamp::NULL),
        QType::Month => Value::Month(Month::NULL),
        QType::Date => Value::Date(Date::NULL),
        QType::Datetime => Value::Datetime(Datetime::NULL),
        QType::Timespan => Value::Timespan(Timespan::NULL),
        QType::Minute => Value::Minute(Minute::NULL),
        QType::Second => Value::Second(Second::NULL),
        QType::Time => Value::Time(Time::NULL),
        QType::UnaryPrimitive => Value::Null,
        other => return Err(TypeError::NoNullValue(other)),
    })
}
