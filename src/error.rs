//! Error taxonomy
//!
//! - `Error`: crate boundary, dipakai oleh connection layer
//! - `ReaderError` / `WriterError`: codec failures, dibedakan dari I/O biasa
//! - `TypeError`, `ModelError`, `ParseError`: registry, value model, text parsing

use std::io;

use crate::protocol::QType;

/// Top-level error untuk semua operasi connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport tidak tersedia atau handshake ditolak
    #[error("connection error: {0}")]
    Connection(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("reader error: {0}")]
    Reader(ReaderError),

    #[error("writer error: {0}")]
    Writer(#[from] WriterError),

    /// Error yang dikirim oleh remote side lewat error tag
    #[error("remote error: {0}")]
    Remote(String),
}

impl Error {
    /// Remote dan protocol errors tidak merusak stream; listener boleh lanjut.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Remote(_) => true,
            Error::Reader(e) => !e.is_io(),
            _ => false,
        }
    }
}

impl From<ReaderError> for Error {
    fn from(e: ReaderError) -> Self {
        match e {
            ReaderError::Remote(message) => Error::Remote(message),
            ReaderError::Io(e) => Error::Io(e),
            other => Error::Reader(other),
        }
    }
}

/// Failure saat membaca atau men-decode message.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Remote error tag; selalu di-raise, tidak pernah jadi value
    #[error("{0}")]
    Remote(String),

    #[error("unexpected end of buffer: need {needed} bytes at offset {offset}, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid length prefix: {0}")]
    InvalidLength(i32),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("unsupported type on read: {0:?}")]
    UnsupportedType(QType),

    #[error("cannot build dictionary from {keys:?} keys and {values:?} values")]
    DictionaryShape { keys: QType, values: QType },

    #[error("invalid uncompressed size: {0}")]
    InvalidCompressedSize(i32),

    #[error("malformed compressed stream: {0}")]
    Compression(&'static str),

    #[error("invalid text: {0}")]
    Text(String),

    #[error("unexpected message type: {0}")]
    UnexpectedMessage(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ReaderError {
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, ReaderError::Io(_))
    }
}

/// Failure saat serialisasi. Buffer selalu dibangun di memory dulu,
/// jadi tidak ada partial write ke transport.
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("cannot serialize {0:?}")]
    UnsupportedType(QType),

    #[error("too many parameters: {0} (max 8)")]
    TooManyParameters(usize),

    #[error("{qtype:?} requires protocol version {required}, negotiated {negotiated}")]
    ProtocolVersion {
        qtype: QType,
        required: u8,
        negotiated: u8,
    },

    #[error("character {0:?} cannot be encoded in a single byte")]
    CharOutOfRange(char),

    #[error("text not representable in target encoding: {0:?}")]
    Text(String),

    #[error("message too large: {0} bytes")]
    MessageTooLarge(usize),
}

/// Type registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("unknown type tag: {0}")]
    UnmappedTag(i8),

    #[error("no wire type for value: {0}")]
    UnmappedShape(String),

    #[error("no null value defined for {0:?}")]
    NoNullValue(QType),
}

/// Invariant violations saat membangun value model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("table requires at least one column")]
    EmptyTable,

    #[error("column names ({columns}) and data columns ({data}) differ")]
    ColumnCountMismatch { columns: usize, data: usize },

    #[error("column {0:?} is not an array")]
    NonArrayColumn(String),

    #[error("column {column:?} has {actual} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("table column names must be a symbol list")]
    TableColumns,

    #[error("table data must be a general list")]
    TableData,

    #[error("dictionary requires at least one key")]
    EmptyDictionary,

    #[error("dictionary keys must be a vector")]
    DictionaryKeys,

    #[error("dictionary values must be a vector or a table")]
    DictionaryValues,

    #[error("dictionary keys ({keys}) and values ({values}) differ in length")]
    DictionaryLength { keys: usize, values: usize },

    #[error("keyed table requires non-empty tables, got {keys} key rows and {values} value rows")]
    KeyedTableRows { keys: usize, values: usize },

    #[error("unknown key column {0:?}")]
    UnknownKeyColumn(String),

    #[error("invalid lambda expression: {0:?}")]
    InvalidLambda(String),

    #[error("cell ({column}, {row}) out of bounds")]
    CellOutOfBounds { column: usize, row: usize },

    #[error("cannot store {value} in column {column:?}")]
    CellType { column: String, value: String },
}

/// Text representation yang tidak valid untuk temporal type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {input:?} as {kind}")]
pub struct ParseError {
    pub kind: &'static str,
    pub input: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }
}
