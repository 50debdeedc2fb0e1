//! Map typed records onto a single DynamoDB table.
//!
//! A [`Table`] binds a physical table name, its key scalar types and a store
//! client. An [`Item`] binds a [`Record`] type to partition/sort key
//! definitions on that table. Key values are composed as
//! `<prefix><separator><value>`, with short prefixes assigned per item type and
//! attribute so heterogeneous records can share one table.
//!
//! ```
//! use std::sync::Arc;
//!
//! use dynamo_items::{InMemoryStore, Item, Key, Record, Schema, Table};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     email: Option<String>,
//! }
//!
//! impl Record for User {
//!     fn schema() -> Schema {
//!         Schema::new("User").required("id").optional("email")
//!     }
//! }
//!
//! # async fn demo() -> dynamo_items::Result<()> {
//! let table = Arc::new(Table::new("dynamo-items", Arc::new(InMemoryStore::new())));
//! let users = Item::<User>::builder(table).partition_key(Key::new("id")).build()?;
//!
//! users.put_item(&User { id: "42".into(), email: None }).await?;
//! let user = users.get_item("42", None).await?;
//! assert_eq!(user.id, "42");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversions;
pub mod store;

mod error;
mod item;
mod table;

pub use config::Config;
pub use error::{Error, Result};
pub use item::{Item, ItemBuilder};
pub use store::{AttributeMap, InMemoryStore, ItemStore, StoreError};
pub use table::Table;

#[cfg(feature = "dynamodb")]
pub use store::DynamoDbStore;

pub use dynamo_items_core::{
    ItemError, Key, KeyValue, PrimaryKey, Record, ScalarType, Schema, SecondaryIndex,
};
