use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::error::{ItemError, Result};

/// Physical attribute holding the partition key.
pub const PARTITION_KEY_ATTRIBUTE: &str = "pk";

/// Physical attribute holding the sort key.
pub const SORT_KEY_ATTRIBUTE: &str = "sk";

/// Sort key value written for items that do not declare a sort key on a
/// table that requires one.
pub const PLACEHOLDER_SORT_KEY: &str = "A";

/// Default separator between a key prefix and the raw value.
pub const DEFAULT_SEPARATOR: char = '#';

/// Which half of the primary key a definition or value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySlot {
    Partition,
    Sort,
}

impl KeySlot {
    /// The physical attribute name for this slot.
    pub fn attribute(&self) -> &'static str {
        match self {
            KeySlot::Partition => PARTITION_KEY_ATTRIBUTE,
            KeySlot::Sort => SORT_KEY_ATTRIBUTE,
        }
    }
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Scalar types allowed for DynamoDB key attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Number,
    Binary,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ScalarType::String => "S",
            ScalarType::Number => "N",
            ScalarType::Binary => "B",
        };
        f.write_str(code)
    }
}

impl std::str::FromStr for ScalarType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S" | "STRING" => Ok(ScalarType::String),
            "N" | "NUMBER" => Ok(ScalarType::Number),
            "B" | "BINARY" => Ok(ScalarType::Binary),
            other => Err(format!("unknown scalar type '{other}', expected S, N or B")),
        }
    }
}

/// Definition of a key: which record attribute feeds it and how it is
/// rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub attr: String,
    /// Whether the value is namespaced with a string prefix.
    pub prefix: bool,
    /// Explicit prefix. When `None` and `prefix` is set, the table assigns one.
    pub prefix_value: Option<String>,
    pub separator: char,
}

impl Key {
    /// A prefixed key on `attr` using the default separator.
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            prefix: true,
            prefix_value: None,
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Disables prefixing; the raw value is coerced to the table key type.
    pub fn without_prefix(mut self) -> Self {
        self.prefix = false;
        self
    }

    /// Uses an explicit prefix instead of an assigned one.
    pub fn with_prefix_value(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = true;
        self.prefix_value = Some(prefix.into());
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }
}

/// A key definition after item construction: the prefix, if any, is final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub attr: String,
    pub prefix: Option<String>,
    pub separator: char,
}

/// A raw key value, as supplied by a caller or read from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    String(String),
    /// Canonical decimal text of the number.
    Number(String),
    Binary(Vec<u8>),
}

impl KeyValue {
    /// Extracts a key value from a serialized record attribute.
    pub fn from_json(value: &Value, slot: KeySlot) -> Result<Self> {
        match value {
            Value::String(s) => Ok(KeyValue::String(s.clone())),
            Value::Number(n) => Ok(KeyValue::Number(n.to_string())),
            Value::Array(items) if items.is_empty() => {
                Err(ItemError::invalid_value(slot, "empty arrays are not keys"))
            }
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(KeyValue::Binary)
                .ok_or_else(|| ItemError::invalid_value(slot, "arrays must hold bytes")),
            Value::Null => Err(ItemError::invalid_value(slot, "value is null")),
            Value::Bool(_) => Err(ItemError::invalid_value(slot, "booleans are not keys")),
            Value::Object(_) => Err(ItemError::invalid_value(slot, "maps are not keys")),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            KeyValue::String(_) => "a string",
            KeyValue::Number(_) => "a number",
            KeyValue::Binary(_) => "bytes",
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::String(s) | KeyValue::Number(s) => f.write_str(s),
            KeyValue::Binary(b) => f.write_str(&STANDARD.encode(b)),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<&String> for KeyValue {
    fn from(value: &String) -> Self {
        KeyValue::String(value.clone())
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(value: Vec<u8>) -> Self {
        KeyValue::Binary(value)
    }
}

impl From<&[u8]> for KeyValue {
    fn from(value: &[u8]) -> Self {
        KeyValue::Binary(value.to_vec())
    }
}

macro_rules! number_key_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for KeyValue {
                fn from(value: $ty) -> Self {
                    KeyValue::Number(value.to_string())
                }
            }
        )*
    };
}

number_key_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

// Floats are rendered by `serde_json` so that lookups match the text written
// from a serialized record (`7.0`, `1e20`).
impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        let text = serde_json::Number::from_f64(value)
            .map(|n| n.to_string())
            .unwrap_or_else(|| value.to_string());
        KeyValue::Number(text)
    }
}

impl From<f32> for KeyValue {
    fn from(value: f32) -> Self {
        KeyValue::from(f64::from(value))
    }
}

/// A composed key value, typed for the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarValue {
    S(String),
    N(String),
    B(Vec<u8>),
}

impl ScalarValue {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarValue::S(_) => ScalarType::String,
            ScalarValue::N(_) => ScalarType::Number,
            ScalarValue::B(_) => ScalarType::Binary,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::S(s) | ScalarValue::N(s) => f.write_str(s),
            ScalarValue::B(b) => f.write_str(&STANDARD.encode(b)),
        }
    }
}
