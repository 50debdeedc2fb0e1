//! In-memory store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dynamo_items_core::keys::{PARTITION_KEY_ATTRIBUTE, SORT_KEY_ATTRIBUTE};
use dynamo_items_core::ScalarValue;
use tokio::sync::RwLock;

use super::{AttributeMap, ItemStore, StoreError};
use crate::conversions::attribute_to_scalar;

type StoredKey = (ScalarValue, Option<ScalarValue>);

/// In-memory store for testing.
///
/// Tables spring into existence on first write. Data is not persisted and will
/// be lost when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, HashMap<StoredKey, AttributeMap>>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record stored in `table`, in no particular order.
    pub async fn items(&self, table: &str) -> Vec<AttributeMap> {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn stored_key(item: &AttributeMap) -> Result<StoredKey, StoreError> {
    let pk = item
        .get(PARTITION_KEY_ATTRIBUTE)
        .and_then(attribute_to_scalar)
        .map(normalize)
        .ok_or_else(|| {
            StoreError::InvalidData(format!("missing scalar '{PARTITION_KEY_ATTRIBUTE}' attribute"))
        })?;

    let sk = match item.get(SORT_KEY_ATTRIBUTE) {
        Some(value) => Some(attribute_to_scalar(value).map(normalize).ok_or_else(|| {
            StoreError::InvalidData(format!("'{SORT_KEY_ATTRIBUTE}' must be a scalar"))
        })?),
        None => None,
    };

    Ok((pk, sk))
}

/// Numbers compare by value, as DynamoDB compares `N` keys.
fn normalize(value: ScalarValue) -> ScalarValue {
    match value {
        ScalarValue::N(n) => ScalarValue::N(canonical_number(&n)),
        other => other,
    }
}

/// Renders decimal text as `<sign><significant digits>e<exponent>`.
fn canonical_number(text: &str) -> String {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => match unsigned[i + 1..].parse::<i64>() {
            Ok(exp) => (&unsigned[..i], exp),
            Err(_) => return text.to_string(),
        },
        None => (unsigned, 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return "0".to_string();
    }

    let significant = digits.trim_end_matches('0');
    let exponent = exponent - frac_part.len() as i64 + (digits.len() - significant.len()) as i64;
    let sign = if negative { "-" } else { "" };
    format!("{sign}{significant}e{exponent}")
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn put_item(&self, table: &str, item: AttributeMap) -> Result<(), StoreError> {
        let key = stored_key(&item)?;
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().insert(key, item);
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: AttributeMap,
    ) -> Result<Option<AttributeMap>, StoreError> {
        let key = stored_key(&key)?;
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|items| items.get(&key)).cloned())
    }
}
