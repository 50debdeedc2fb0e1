//! Functional core for `dynamo_items`.
//!
//! Everything here is pure data and pure functions: record schemas, key
//! definitions, the prefix registry, key composition and item key
//! resolution. The `dynamo_items` crate wires these into tables, item mappers
//! and stores.

mod error;
mod item;
mod schema;
mod table;

pub mod keys;

pub use error::{ItemError, Result};
pub use item::{ItemKeys, PrimaryKey};
pub use keys::{Key, KeySlot, KeyValue, PrefixRegistry, ScalarType, ScalarValue};
pub use schema::{Field, Record, Schema};
pub use table::{SecondaryIndex, TableSchema};
