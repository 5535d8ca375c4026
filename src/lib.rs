//! qwire - Client library untuk q/kdb+ binary IPC protocol
//!
//! Arsitektur:
//! - Core: value model (atoms, vectors, tables, dictionaries, temporal types)
//! - Protocol: endian-aware reader, type registry, decompressor, encoder/decoder
//! - Network: blocking TCP connection dengan handshake dan callback listener
//!
//! ```no_run
//! use qwire::network::{Connection, ConnectionOptions};
//!
//! let mut conn = Connection::new(ConnectionOptions::default().port(5000));
//! conn.open()?;
//! let result = conn.sync("til 10", &[])?;
//! println!("{result}");
//! # Ok::<(), qwire::Error>(())
//! ```

pub mod core;
pub mod error;
pub mod network;
pub mod protocol;

pub use crate::core::Value;
pub use crate::error::{Error, ModelError, ParseError, ReaderError, TypeError, WriterError};
