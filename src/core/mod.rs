//! Core module: value model
//!
//! Prinsip desain:
//! - Closed domain: satu enum `Value` untuk semua shape di wire
//! - Immutable setelah dibangun, kecuali cell write eksplisit via `Table::set`
//! - Invariant dicek saat konstruksi (`ModelError`)

mod dictionary;
mod function;
mod keyed_table;
mod table;
pub mod temporal;
mod value;

pub use dictionary::Dictionary;
pub use function::{Function, Lambda, Projection};
pub use keyed_table::KeyedTable;
pub use table::{Row, Table};
pub use temporal::{Date, Datetime, Minute, Month, Second, Time, Timespan, Timestamp};
pub use value::Value;
