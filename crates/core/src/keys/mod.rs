//! Key definitions, prefixes and key value composition.
//!
//! All functions are sync and have no side effects beyond the registry they
//! are handed.

mod compose;
mod prefix;
mod types;

pub use compose::{coerce, compose};
pub use prefix::PrefixRegistry;
pub use types::{
    Key, KeySlot, KeyValue, ResolvedKey, ScalarType, ScalarValue, DEFAULT_SEPARATOR,
    PARTITION_KEY_ATTRIBUTE, PLACEHOLDER_SORT_KEY, SORT_KEY_ATTRIBUTE,
};
