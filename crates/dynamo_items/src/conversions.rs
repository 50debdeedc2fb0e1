//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between serialized records (`serde_json`
//! values) and DynamoDB `AttributeValue` maps. These are testable in isolation
//! without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use dynamo_items_core::keys::{PARTITION_KEY_ATTRIBUTE, SORT_KEY_ATTRIBUTE};
use dynamo_items_core::{PrimaryKey, ScalarValue};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::store::AttributeMap;

// ============================================================================
// Keys
// ============================================================================

/// Convert a composed key value into an attribute value.
pub fn scalar_to_attribute(value: &ScalarValue) -> AttributeValue {
    match value {
        ScalarValue::S(s) => AttributeValue::S(s.clone()),
        ScalarValue::N(n) => AttributeValue::N(n.clone()),
        ScalarValue::B(b) => AttributeValue::B(Blob::new(b.clone())),
    }
}

/// Read a key attribute value back into a scalar, if it is one.
pub fn attribute_to_scalar(value: &AttributeValue) -> Option<ScalarValue> {
    match value {
        AttributeValue::S(s) => Some(ScalarValue::S(s.clone())),
        AttributeValue::N(n) => Some(ScalarValue::N(n.clone())),
        AttributeValue::B(b) => Some(ScalarValue::B(b.as_ref().to_vec())),
        _ => None,
    }
}

/// Convert a primary key into the `{pk, sk?}` key map.
pub fn key_to_attributes(key: &PrimaryKey) -> AttributeMap {
    let mut item = HashMap::new();
    item.insert(
        PARTITION_KEY_ATTRIBUTE.to_string(),
        scalar_to_attribute(&key.pk),
    );
    if let Some(sk) = &key.sk {
        item.insert(SORT_KEY_ATTRIBUTE.to_string(), scalar_to_attribute(sk));
    }
    item
}

// ============================================================================
// Records
// ============================================================================

/// Convert a serialized record into DynamoDB attributes.
pub fn json_to_attributes(fields: Map<String, Value>) -> AttributeMap {
    fields
        .into_iter()
        .map(|(name, value)| (name, json_to_attribute(value)))
        .collect()
}

/// Convert a single JSON value into an attribute value.
pub fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => {
            AttributeValue::L(items.into_iter().map(json_to_attribute).collect())
        }
        Value::Object(map) => AttributeValue::M(json_to_attributes(map)),
    }
}

/// Convert DynamoDB attributes into a JSON object ready for deserialization.
pub fn attributes_to_json(item: AttributeMap) -> Result<Value> {
    let fields = item
        .into_iter()
        .map(|(name, value)| attribute_to_json(value).map(|v| (name, v)))
        .collect::<Result<Map<String, Value>>>()?;
    Ok(Value::Object(fields))
}

/// Convert a single attribute value into JSON.
///
/// Binary values become arrays of bytes, mirroring how `serde` serializes
/// `Vec<u8>`.
pub fn attribute_to_json(value: AttributeValue) -> Result<Value> {
    match value {
        AttributeValue::S(s) => Ok(Value::String(s)),
        AttributeValue::N(n) => number_to_json(&n),
        AttributeValue::Bool(b) => Ok(Value::Bool(b)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::B(b) => Ok(bytes_to_json(b.as_ref())),
        AttributeValue::L(items) => items
            .into_iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        AttributeValue::M(map) => attributes_to_json(map),
        AttributeValue::Ss(items) => Ok(Value::Array(items.into_iter().map(Value::String).collect())),
        AttributeValue::Ns(items) => items
            .iter()
            .map(|n| number_to_json(n))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        AttributeValue::Bs(items) => Ok(Value::Array(
            items.iter().map(|b| bytes_to_json(b.as_ref())).collect(),
        )),
        other => Err(Error::Serialization(format!(
            "Unsupported attribute value: {:?}",
            other
        ))),
    }
}

fn number_to_json(text: &str) -> Result<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::Number(n.into()));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Ok(Value::Number(n.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::Serialization(format!("Invalid number attribute: {}", text)))
}

fn bytes_to_json(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| Value::Number((*b).into())).collect())
}
