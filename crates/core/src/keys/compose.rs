//! Key value composition.
//!
//! Pure functions turning a raw key value into the value stored in the
//! `pk`/`sk` attribute.

use crate::error::{ItemError, Result};

use super::types::{KeySlot, KeyValue, ResolvedKey, ScalarType, ScalarValue};

/// Composes the stored value for `key` from a raw value.
///
/// Prefixed keys render as `<prefix><separator><raw>`. Unprefixed keys are
/// coerced to `slot_type`, the table's scalar type for that slot.
pub fn compose(
    key: &ResolvedKey,
    raw: &KeyValue,
    slot: KeySlot,
    slot_type: ScalarType,
) -> Result<ScalarValue> {
    match &key.prefix {
        Some(prefix) => Ok(ScalarValue::S(format!("{prefix}{}{raw}", key.separator))),
        None => coerce(raw, slot, slot_type),
    }
}

/// Coerces a raw value into the given scalar type.
pub fn coerce(raw: &KeyValue, slot: KeySlot, to: ScalarType) -> Result<ScalarValue> {
    match (raw, to) {
        (KeyValue::String(s), ScalarType::String) => Ok(ScalarValue::S(s.clone())),
        (KeyValue::Number(n), ScalarType::String) => Ok(ScalarValue::S(n.clone())),
        (KeyValue::Binary(_), ScalarType::String) => Ok(ScalarValue::S(raw.to_string())),
        (KeyValue::String(s), ScalarType::Number) => parse_number(s, slot),
        (KeyValue::Number(n), ScalarType::Number) => parse_number(n, slot),
        (KeyValue::String(s), ScalarType::Binary) => Ok(ScalarValue::B(s.as_bytes().to_vec())),
        (KeyValue::Binary(b), ScalarType::Binary) => Ok(ScalarValue::B(b.clone())),
        (value, to) => Err(ItemError::coercion(slot, value.kind(), to)),
    }
}

fn parse_number(text: &str, slot: KeySlot) -> Result<ScalarValue> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(ScalarValue::N(trimmed.to_string())),
        _ => Err(ItemError::invalid_value(
            slot,
            format!("'{text}' is not a finite number"),
        )),
    }
}
