//! Network Layer: Blocking TCP Client
//!
//! Fitur:
//! - Handshake dengan capability negotiation (fallback ke versi lama)
//! - Sync / async queries dengan maksimal 8 parameter
//! - Callback listener di thread terpisah

mod connection;
mod listener;

pub use connection::{Connection, ConnectionOptions, MAX_QUERY_PARAMETERS};
pub use listener::{CallbackConnection, MessageHandler};
