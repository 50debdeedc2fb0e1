//! Table wrapper.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dynamo_items_core::{
    ItemKeys, Key, PrefixRegistry, ScalarType, Schema, SecondaryIndex, TableSchema,
};

use crate::config::Config;
use crate::error::Result;
use crate::store::ItemStore;

/// A physical table shared by one or more item types.
///
/// Holds the key schema, the store client, and the prefix registry that keeps
/// key prefixes unique across every item type bound to this table.
pub struct Table {
    schema: TableSchema,
    prefixes: Mutex<PrefixRegistry>,
    indexes: Mutex<Vec<SecondaryIndex>>,
    store: Arc<dyn ItemStore>,
}

impl Table {
    /// Creates a table with a string partition key and no sort key.
    pub fn new(name: impl Into<String>, store: Arc<dyn ItemStore>) -> Self {
        Self {
            schema: TableSchema::new(name),
            prefixes: Mutex::new(PrefixRegistry::new()),
            indexes: Mutex::new(Vec::new()),
            store,
        }
    }

    /// Creates the default table named by `DYDB_TABLE_NAME`.
    pub fn from_config(config: &Config, store: Arc<dyn ItemStore>) -> Self {
        Self::new(config.table_name.clone(), store)
    }

    pub fn with_partition_key(mut self, scalar: ScalarType) -> Self {
        self.schema = self.schema.with_partition_key(scalar);
        self
    }

    pub fn with_sort_key(mut self, scalar: ScalarType) -> Self {
        self.schema = self.schema.with_sort_key(scalar);
        self
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    /// Returns the prefix for `item_type.attr`, assigning one on first use.
    pub fn assign_prefix(&self, item_type: &str, attr: &str) -> Result<String> {
        let prefix = self.registry().assign(item_type, attr)?;
        Ok(prefix)
    }

    /// Current prefix assignments as `("<ItemType>.<attr>", prefix)` pairs,
    /// sorted by item.
    pub fn prefixes(&self) -> Vec<(String, String)> {
        let mut all: Vec<(String, String)> = self
            .registry()
            .assignments()
            .map(|(item, prefix)| (item.to_string(), prefix.to_string()))
            .collect();
        all.sort();
        all
    }

    /// Records a secondary index descriptor on the table.
    pub fn add_secondary_index(&self, index: SecondaryIndex) {
        self.indexes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(index);
    }

    pub fn secondary_indexes(&self) -> Vec<SecondaryIndex> {
        self.indexes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validates and resolves the keys of an item type bound to this table.
    pub(crate) fn resolve_keys(
        &self,
        schema: &Schema,
        pk: Option<Key>,
        sk: Option<Key>,
    ) -> Result<ItemKeys> {
        let mut registry = self.registry();
        let keys = ItemKeys::resolve(schema, pk, sk, &self.schema, &mut registry)?;
        tracing::debug!(
            table = %self.schema.name,
            item_type = %keys.item_type(),
            pk_prefix = ?keys.partition_key().prefix,
            sk_prefix = ?keys.sort_key().and_then(|k| k.prefix.as_deref()),
            "Item keys resolved"
        );
        Ok(keys)
    }

    fn registry(&self) -> MutexGuard<'_, PrefixRegistry> {
        self.prefixes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.schema)
            .field("prefixes", &self.prefixes)
            .field("indexes", &self.indexes)
            .finish_non_exhaustive()
    }
}
