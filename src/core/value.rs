//! Value: tagged union atas seluruh shape yang bisa lewat wire
//!
//! Satu variant per atom kind, satu `*List` variant per vector kind,
//! plus general list, string (char vector), containers dan functions.

use std::fmt;

use uuid::Uuid;

use super::temporal::{Date, Datetime, Minute, Month, Second, Time, Timespan, Timestamp};
use super::{Dictionary, Function, KeyedTable, Table};

#[derive(Debug, Clone)]
pub enum Value {
    /// Generic null `::`
    Null,

    Bool(bool),
    Guid(Uuid),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    /// 32-bit float (q `real`)
    Real(f32),
    /// 64-bit float (q `float`)
    Float(f64),
    Char(char),
    Symbol(String),
    Timestamp(Timestamp),
    Month(Month),
    Date(Date),
    Datetime(Datetime),
    Timespan(Timespan),
    Minute(Minute),
    Second(Second),
    Time(Time),

    /// General (heterogeneous) list
    List(Vec<Value>),
    BoolList(Vec<bool>),
    GuidList(Vec<Uuid>),
    ByteList(Vec<u8>),
    ShortList(Vec<i16>),
    IntList(Vec<i32>),
    LongList(Vec<i64>),
    RealList(Vec<f32>),
    FloatList(Vec<f64>),
    /// Char vector, di wire dengan byte-length prefix
    String(String),
    SymbolList(Vec<String>),
    TimestampList(Vec<Timestamp>),
    MonthList(Vec<Month>),
    DateList(Vec<Date>),
    DatetimeList(Vec<Datetime>),
    TimespanList(Vec<Timespan>),
    MinuteList(Vec<Minute>),
    SecondList(Vec<Second>),
    TimeList(Vec<Time>),

    /// Error message untuk dikirim ke remote side
    Error(String),
    Dictionary(Box<Dictionary>),
    Table(Table),
    KeyedTable(Box<KeyedTable>),
    Function(Function),
}

/// NaN == NaN, sisanya bit-wise equality
#[inline(always)]
fn f32_eq(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

#[inline(always)]
fn f64_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Guid(a), Guid(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Real(a), Real(b)) => f32_eq(*a, *b),
            (Float(a), Float(b)) => f64_eq(*a, *b),
            (Char(a), Char(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Month(a), Month(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Datetime(a), Datetime(b)) => a == b,
            (Timespan(a), Timespan(b)) => a == b,
            (Minute(a), Minute(b)) => a == b,
            (Second(a), Second(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (List(a), List(b)) => a == b,
            (BoolList(a), BoolList(b)) => a == b,
            (GuidList(a), GuidList(b)) => a == b,
            (ByteList(a), ByteList(b)) => a == b,
            (ShortList(a), ShortList(b)) => a == b,
            (IntList(a), IntList(b)) => a == b,
            (LongList(a), LongList(b)) => a == b,
            (RealList(a), RealList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| f32_eq(*x, *y))
            }
            (FloatList(a), FloatList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| f64_eq(*x, *y))
            }
            (String(a), String(b)) => a == b,
            (SymbolList(a), SymbolList(b)) => a == b,
            (TimestampList(a), TimestampList(b)) => a == b,
            (MonthList(a), MonthList(b)) => a == b,
            (DateList(a), DateList(b)) => a == b,
            (DatetimeList(a), DatetimeList(b)) => a == b,
            (TimespanList(a), TimespanList(b)) => a == b,
            (MinuteList(a), MinuteList(b)) => a == b,
            (SecondList(a), SecondList(b)) => a == b,
            (TimeList(a), TimeList(b)) => a == b,
            (Error(a), Error(b)) => a == b,
            (Dictionary(a), Dictionary(b)) => a == b,
            (Table(a), Table(b)) => a == b,
            (KeyedTable(a), KeyedTable(b)) => a == b,
            (Function(a), Function(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn symbol(text: impl Into<String>) -> Self {
        Value::Symbol(text.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn symbols<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Value::SymbolList(items.into_iter().map(Into::into).collect())
    }

    /// True untuk semua vector, string dan general list
    pub fn is_array(&self) -> bool {
        use Value::*;
        matches!(
            self,
            List(_)
                | BoolList(_)
                | GuidList(_)
                | ByteList(_)
                | ShortList(_)
                | IntList(_)
                | LongList(_)
                | RealList(_)
                | FloatList(_)
                | String(_)
                | SymbolList(_)
                | TimestampList(_)
                | MonthList(_)
                | DateList(_)
                | DatetimeList(_)
                | TimespanList(_)
                | MinuteList(_)
                | SecondList(_)
                | TimeList(_)
        )
    }

    /// Jumlah element (arrays), rows (tables) atau keys (dictionary).
    /// `None` untuk atoms.
    pub fn len(&self) -> Option<usize> {
        use Value::*;
        Some(match self {
            List(v) => v.len(),
            BoolList(v) => v.len(),
            GuidList(v) => v.len(),
            ByteList(v) => v.len(),
            ShortList(v) => v.len(),
            IntList(v) => v.len(),
            LongList(v) => v.len(),
            RealList(v) => v.len(),
            FloatList(v) => v.len(),
            String(s) => s.chars().count(),
            SymbolList(v) => v.len(),
            TimestampList(v) => v.len(),
            MonthList(v) => v.len(),
            DateList(v) => v.len(),
            DatetimeList(v) => v.len(),
            TimespanList(v) => v.len(),
            MinuteList(v) => v.len(),
            SecondList(v) => v.len(),
            TimeList(v) => v.len(),
            Dictionary(d) => d.len(),
            Table(t) => t.rows_count(),
            KeyedTable(t) => t.rows_count(),
            _ => return None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Atom view dari element ke-`index` sebuah array
    pub fn element(&self, index: usize) -> Option<Value> {
        use Value::*;
        match self {
            List(v) => v.get(index).cloned(),
            BoolList(v) => v.get(index).copied().map(Bool),
            GuidList(v) => v.get(index).copied().map(Guid),
            ByteList(v) => v.get(index).copied().map(Byte),
            ShortList(v) => v.get(index).copied().map(Short),
            IntList(v) => v.get(index).copied().map(Int),
            LongList(v) => v.get(index).copied().map(Long),
            RealList(v) => v.get(index).copied().map(Real),
            FloatList(v) => v.get(index).copied().map(Float),
            String(s) => s.chars().nth(index).map(Char),
            SymbolList(v) => v.get(index).cloned().map(Symbol),
            TimestampList(v) => v.get(index).copied().map(Timestamp),
            MonthList(v) => v.get(index).copied().map(Month),
            DateList(v) => v.get(index).copied().map(Date),
            DatetimeList(v) => v.get(index).copied().map(Datetime),
            TimespanList(v) => v.get(index).copied().map(Timespan),
            MinuteList(v) => v.get(index).copied().map(Minute),
            SecondList(v) => v.get(index).copied().map(Second),
            TimeList(v) => v.get(index).copied().map(Time),
            _ => None,
        }
    }

    /// Tulis atom ke slot array. `false` jika index diluar range
    /// atau type atom tidak cocok dengan element type.
    pub(crate) fn set_element(&mut self, index: usize, value: Value) -> bool {
        macro_rules! store {
            ($vec:expr, $item:expr) => {
                match $vec.get_mut(index) {
                    Some(slot) => {
                        *slot = $item;
                        true
                    }
                    None => false,
                }
            };
        }

        use Value::*;
        match (self, value) {
            (List(v), x) => store!(v, x),
            (BoolList(v), Bool(x)) => store!(v, x),
            (GuidList(v), Guid(x)) => store!(v, x),
            (ByteList(v), Byte(x)) => store!(v, x),
            (ShortList(v), Short(x)) => store!(v, x),
            (IntList(v), Int(x)) => store!(v, x),
            (LongList(v), Long(x)) => store!(v, x),
            (RealList(v), Real(x)) => store!(v, x),
            (FloatList(v), Float(x)) => store!(v, x),
            (SymbolList(v), Symbol(x)) => store!(v, x),
            (TimestampList(v), Timestamp(x)) => store!(v, x),
            (MonthList(v), Month(x)) => store!(v, x),
            (DateList(v), Date(x)) => store!(v, x),
            (DatetimeList(v), Datetime(x)) => store!(v, x),
            (TimespanList(v), Timespan(x)) => store!(v, x),
            (MinuteList(v), Minute(x)) => store!(v, x),
            (SecondList(v), Second(x)) => store!(v, x),
            (TimeList(v), Time(x)) => store!(v, x),
            (String(s), Char(c)) => {
                let mut chars: Vec<char> = s.chars().collect();
                let stored = store!(chars, c);
                if stored {
                    *s = chars.into_iter().collect();
                }
                stored
            }
            _ => false,
        }
    }

    /// True jika atom sama dengan null sentinel type-nya
    pub fn is_null(&self) -> bool {
        use Value::*;
        match self {
            Null => true,
            Bool(b) => !b,
            Guid(g) => g.is_nil(),
            Byte(b) => *b == 0,
            Short(v) => *v == i16::MIN,
            Int(v) => *v == i32::MIN,
            Long(v) => *v == i64::MIN,
            Real(v) => v.is_nan(),
            Float(v) => v.is_nan(),
            Char(c) => *c == ' ',
            Symbol(s) => s.is_empty(),
            Timestamp(t) => t.is_null(),
            Month(t) => t.is_null(),
            Date(t) => t.is_null(),
            Datetime(t) => t.is_null(),
            Timespan(t) => t.is_null(),
            Minute(t) => t.is_null(),
            Second(t) => t.is_null(),
            Time(t) => t.is_null(),
            _ => false,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) | Value::String(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    Uuid => Guid,
    u8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Real,
    f64 => Float,
    char => Char,
    Timestamp => Timestamp,
    Month => Month,
    Date => Date,
    Datetime => Datetime,
    Timespan => Timespan,
    Minute => Minute,
    Second => Second,
    Time => Time,
    Vec<Value> => List,
    Vec<bool> => BoolList,
    Vec<Uuid> => GuidList,
    Vec<u8> => ByteList,
    Vec<i16> => ShortList,
    Vec<i32> => IntList,
    Vec<i64> => LongList,
    Vec<f32> => RealList,
    Vec<f64> => FloatList,
    Vec<Timestamp> => TimestampList,
    Vec<Month> => MonthList,
    Vec<Date> => DateList,
    Vec<Datetime> => DatetimeList,
    Vec<Timespan> => TimespanList,
    Vec<Minute> => MinuteList,
    Vec<Second> => SecondList,
    Vec<Time> => TimeList,
    Table => Table,
    Function => Function,
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dictionary(Box::new(d))
    }
}

impl From<KeyedTable> for Value {
    fn from(t: KeyedTable) -> Self {
        Value::KeyedTable(Box::new(t))
    }
}

/// Tulis list dengan format q: `,x` untuk satu element, `()` untuk kosong
fn write_items<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
    suffix: &str,
    mut each: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    match items.len() {
        0 => return f.write_str("()"),
        1 => f.write_str(",")?,
        _ => {}
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        each(f, item)?;
    }
    f.write_str(suffix)
}

fn write_short(f: &mut fmt::Formatter<'_>, v: i16) -> fmt::Result {
    if v == i16::MIN {
        f.write_str("0N")
    } else {
        write!(f, "{v}")
    }
}

fn write_int(f: &mut fmt::Formatter<'_>, v: i32) -> fmt::Result {
    if v == i32::MIN {
        f.write_str("0N")
    } else {
        write!(f, "{v}")
    }
}

fn write_long(f: &mut fmt::Formatter<'_>, v: i64) -> fmt::Result {
    if v == i64::MIN {
        f.write_str("0N")
    } else {
        write!(f, "{v}")
    }
}

fn write_real(f: &mut fmt::Formatter<'_>, v: f32) -> fmt::Result {
    if v.is_nan() {
        f.write_str("0n")
    } else {
        write!(f, "{v}")
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("0n")
    } else {
        write!(f, "{v}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Value::*;
        match self {
            Null => f.write_str("::"),
            Bool(b) => write!(f, "{}b", *b as u8),
            Guid(g) => write!(f, "{g}"),
            Byte(b) => write!(f, "0x{b:02x}"),
            Short(v) => {
                write_short(f, *v)?;
                f.write_str("h")
            }
            Int(v) => {
                write_int(f, *v)?;
                f.write_str("i")
            }
            Long(v) => write_long(f, *v),
            Real(v) => {
                write_real(f, *v)?;
                f.write_str("e")
            }
            Float(v) => write_float(f, *v),
            Char(c) => write!(f, "\"{c}\""),
            Symbol(s) => write!(f, "`{s}"),
            Timestamp(t) => write!(f, "{t}"),
            Month(t) => write!(f, "{t}"),
            Date(t) => write!(f, "{t}"),
            Datetime(t) => write!(f, "{t}"),
            Timespan(t) => write!(f, "{t}"),
            Minute(t) => write!(f, "{t}"),
            Second(t) => write!(f, "{t}"),
            Time(t) => write!(f, "{t}"),

            List(items) => match items.len() {
                0 => f.write_str("()"),
                1 => write!(f, "enlist {}", items[0]),
                _ => {
                    f.write_str("(")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(";")?;
                        }
                        write!(f, "{item}")?;
                    }
                    f.write_str(")")
                }
            },
            BoolList(v) => {
                if v.len() == 1 {
                    f.write_str(",")?;
                }
                for b in v {
                    write!(f, "{}", *b as u8)?;
                }
                f.write_str("b")
            }
            GuidList(v) => write_items(f, v, " ", "", |f, g| write!(f, "{g}")),
            ByteList(v) => {
                if v.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str("0x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            ShortList(v) => write_items(f, v, " ", "h", |f, x| write_short(f, *x)),
            IntList(v) => write_items(f, v, " ", "i", |f, x| write_int(f, *x)),
            LongList(v) => write_items(f, v, " ", "", |f, x| write_long(f, *x)),
            RealList(v) => write_items(f, v, " ", "e", |f, x| write_real(f, *x)),
            FloatList(v) => write_items(f, v, " ", "", |f, x| write_float(f, *x)),
            String(s) => write!(f, "\"{s}\""),
            SymbolList(v) => write_items(f, v, "", "", |f, s| write!(f, "`{s}")),
            TimestampList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),
            MonthList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),
            DateList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),
            DatetimeList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),
            TimespanList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),
            MinuteList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),
            SecondList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),
            TimeList(v) => write_items(f, v, " ", "", |f, t| write!(f, "{t}")),

            Error(message) => write!(f, "'{message}"),
            Dictionary(d) => write!(f, "{d}"),
            Table(t) => write!(f, "{t}"),
            KeyedTable(t) => write!(f, "{t}"),
            Function(func) => write!(f, "{func}"),
        }
    }
}
