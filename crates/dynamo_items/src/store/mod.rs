//! Store backends.
//!
//! An [`ItemStore`] is the only seam between item mappers and the database:
//! one upsert and one point read, both keyed by the `{pk, sk?}` attributes.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): [`DynamoDbStore`] over `aws-sdk-dynamodb`
//!
//! [`InMemoryStore`] is always available and backs the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use thiserror::Error;

mod memory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use memory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

/// A record (or key) in the store's native representation.
pub type AttributeMap = HashMap<String, AttributeValue>;

/// Errors reported by store backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Native put/get operations of a key-value store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Writes `item`, replacing any record with the same key.
    async fn put_item(&self, table: &str, item: AttributeMap) -> Result<(), StoreError>;

    /// Reads the record stored under `key`.
    async fn get_item(
        &self,
        table: &str,
        key: AttributeMap,
    ) -> Result<Option<AttributeMap>, StoreError>;
}
