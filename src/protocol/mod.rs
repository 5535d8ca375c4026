//! Protocol Layer: q IPC Binary Encoding
//!
//! Prinsip desain:
//! - Single pass: decode tanpa backtracking, encode ke satu buffer
//! - Header selalu 8 bytes; payload mengikuti endianness di header
//! - Writer selalu little-endian, version-gated per type

mod compression;
mod debug;
mod decoder;
mod encoder;
mod endian;
mod io;
mod message;
mod qtype;
mod text;

pub use compression::decompress;
pub use debug::{FileDumpSink, ProtocolDebugSink, PROTOCOL_DEBUG_ENV};
pub use decoder::Decoder;
pub use encoder::{Encoder, MAX_PROTOCOL_VERSION};
pub use endian::{EndianReader, Endianness};
pub use io::{MessageReader, MessageWriter, DEFAULT_MAX_READING_CHUNK};
pub use message::{Message, MessageHeader, MessageType, HEADER_SIZE};
pub use qtype::{null_of, QType};
pub use text::TextEncoding;
