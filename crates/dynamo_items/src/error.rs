use dynamo_items_core::ItemError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by tables and item mappers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{item_type} not found: {key}")]
    NotFound { item_type: String, key: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for table and item operations.
pub type Result<T> = std::result::Result<T, Error>;
