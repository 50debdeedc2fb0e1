use thiserror::Error;

use crate::keys::{KeySlot, ScalarType};

/// Errors raised while resolving item keys or composing key values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("The item type '{item_type}' does not declare any fields")]
    EmptySchema { item_type: String },

    #[error("The item type '{item_type}' does not have the attribute '{attr}'")]
    UnknownAttribute { item_type: String, attr: String },

    #[error("The attribute '{attr}' of '{item_type}' cannot be optional when used as a key")]
    InvalidKeyType { item_type: String, attr: String },

    #[error("Incompatible key configuration for '{slot}': {reason}")]
    IncompatibleKeyConfiguration { slot: KeySlot, reason: String },

    #[error("The attribute '{attr}' of '{item_type}' collides with the '{slot}' key attribute")]
    ReservedAttribute {
        item_type: String,
        attr: String,
        slot: KeySlot,
    },

    #[error("No prefix left for '{item_type}.{attr}': every candidate is already taken")]
    PrefixSpaceExhausted { item_type: String, attr: String },

    #[error("The prefix '{prefix}' requested by '{item}' is already used by '{owner}'")]
    PrefixInUse {
        prefix: String,
        item: String,
        owner: String,
    },

    #[error("Invalid value for '{slot}' key: {reason}")]
    InvalidKeyValue { slot: KeySlot, reason: String },
}

impl ItemError {
    pub(crate) fn incompatible(slot: KeySlot, reason: impl Into<String>) -> Self {
        Self::IncompatibleKeyConfiguration {
            slot,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(slot: KeySlot, reason: impl Into<String>) -> Self {
        Self::InvalidKeyValue {
            slot,
            reason: reason.into(),
        }
    }

    pub(crate) fn coercion(slot: KeySlot, from: &str, to: ScalarType) -> Self {
        Self::invalid_value(slot, format!("cannot coerce {from} into a '{to}' key"))
    }
}

/// Result type for key resolution and composition.
pub type Result<T> = std::result::Result<T, ItemError>;
