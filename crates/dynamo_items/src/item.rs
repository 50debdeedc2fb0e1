//! Item mapper.
//!
//! Binds a [`Record`] type to its key definitions on a [`Table`] and
//! translates records to and from the store's native representation.

use std::marker::PhantomData;
use std::sync::Arc;

use dynamo_items_core::keys::{PARTITION_KEY_ATTRIBUTE, SORT_KEY_ATTRIBUTE};
use dynamo_items_core::{ItemKeys, Key, KeyValue, Record, SecondaryIndex};
use serde_json::Value;

use crate::conversions::{attributes_to_json, json_to_attributes, key_to_attributes};
use crate::error::{Error, Result};
use crate::table::Table;

/// Maps records of type `T` onto a table.
pub struct Item<T> {
    table: Arc<Table>,
    keys: ItemKeys,
    indexes: Vec<SecondaryIndex>,
    _record: PhantomData<fn() -> T>,
}

/// Builder for [`Item`]. Nothing is validated until [`ItemBuilder::build`].
pub struct ItemBuilder<T> {
    table: Arc<Table>,
    pk: Option<Key>,
    sk: Option<Key>,
    indexes: Vec<SecondaryIndex>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> ItemBuilder<T> {
    /// Sets the partition key definition. Defaults to the first declared field.
    pub fn partition_key(mut self, key: Key) -> Self {
        self.pk = Some(key);
        self
    }

    pub fn sort_key(mut self, key: Key) -> Self {
        self.sk = Some(key);
        self
    }

    pub fn secondary_index(mut self, index: SecondaryIndex) -> Self {
        self.indexes.push(index);
        self
    }

    /// Validates the key definitions and resolves their prefixes.
    pub fn build(self) -> Result<Item<T>> {
        let keys = self.table.resolve_keys(&T::schema(), self.pk, self.sk)?;
        Ok(Item {
            table: self.table,
            keys,
            indexes: self.indexes,
            _record: PhantomData,
        })
    }
}

impl<T: Record> Item<T> {
    /// Creates an item keyed on the first declared field of `T`.
    pub fn new(table: Arc<Table>) -> Result<Self> {
        Self::builder(table).build()
    }

    pub fn builder(table: Arc<Table>) -> ItemBuilder<T> {
        ItemBuilder {
            table,
            pk: None,
            sk: None,
            indexes: Vec::new(),
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn keys(&self) -> &ItemKeys {
        &self.keys
    }

    pub fn secondary_indexes(&self) -> &[SecondaryIndex] {
        &self.indexes
    }

    /// Writes `record`, replacing any record stored under the same key.
    ///
    /// The stored item carries the composed `pk`/`sk` attributes followed by
    /// every serialized field of the record, key fields included.
    pub async fn put_item(&self, record: &T) -> Result<()> {
        let fields = match serde_json::to_value(record)? {
            Value::Object(fields) => fields,
            other => {
                return Err(Error::Serialization(format!(
                    "{} must serialize to a map, got {}",
                    self.keys.item_type(),
                    other
                )))
            }
        };

        let key = self.keys.key_for_record(&fields)?;
        let mut item = key_to_attributes(&key);
        item.extend(json_to_attributes(fields));

        tracing::debug!(
            table = %self.table.name(),
            item_type = %self.keys.item_type(),
            %key,
            attributes = item.len(),
            "Putting item"
        );

        self.table.store().put_item(self.table.name(), item).await?;
        Ok(())
    }

    /// Reads the record stored under the given raw key values.
    ///
    /// Returns [`Error::NotFound`] when no record exists.
    pub async fn get_item(
        &self,
        pk: impl Into<KeyValue>,
        sk: Option<KeyValue>,
    ) -> Result<T> {
        let key = self.keys.key_for_lookup(&pk.into(), sk.as_ref())?;

        tracing::debug!(
            table = %self.table.name(),
            item_type = %self.keys.item_type(),
            %key,
            "Getting item"
        );

        let mut item = self
            .table
            .store()
            .get_item(self.table.name(), key_to_attributes(&key))
            .await?
            .ok_or_else(|| Error::NotFound {
                item_type: self.keys.item_type().to_string(),
                key: key.to_string(),
            })?;

        // Key attributes are not record fields.
        item.remove(PARTITION_KEY_ATTRIBUTE);
        if self.table.schema().sort_key.is_some() {
            item.remove(SORT_KEY_ATTRIBUTE);
        }

        let record = serde_json::from_value(attributes_to_json(item)?)?;
        Ok(record)
    }
}

impl<T> std::fmt::Debug for Item<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("table", &self.table.name())
            .field("keys", &self.keys)
            .field("indexes", &self.indexes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AttributeMap, InMemoryStore, ItemStore, StoreError};
    use aws_sdk_dynamodb::types::AttributeValue;
    use dynamo_items_core::{ItemError, KeySlot, ScalarType, Schema};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        name: String,
        age: u32,
        email: Option<String>,
    }

    impl Record for User {
        fn schema() -> Schema {
            Schema::new("User")
                .required("id")
                .required("name")
                .required("age")
                .optional("email")
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        user_id: String,
        order_id: u64,
        total: f64,
        tags: Vec<String>,
    }

    impl Record for Order {
        fn schema() -> Schema {
            Schema::new("Order")
                .required("user_id")
                .required("order_id")
                .required("total")
                .required("tags")
        }
    }

    fn ada() -> User {
        User {
            id: "42".to_string(),
            name: "Ada".to_string(),
            age: 36,
            email: Some("ada@example.com".to_string()),
        }
    }

    fn setup(table: impl FnOnce(Table) -> Table) -> (InMemoryStore, Arc<Table>) {
        let store = InMemoryStore::new();
        let table = table(Table::new("items", Arc::new(store.clone())));
        (store, Arc::new(table))
    }

    #[tokio::test]
    async fn test_round_trip_with_prefixed_string_key() {
        let (_, table) = setup(|t| t);
        let users = Item::<User>::new(table).unwrap();

        users.put_item(&ada()).await.unwrap();
        let found = users.get_item("42", None).await.unwrap();

        assert_eq!(found, ada());
    }

    #[tokio::test]
    async fn test_stored_item_is_denormalized() {
        let (store, table) = setup(|t| t);
        let users = Item::<User>::new(table).unwrap();
        users.put_item(&ada()).await.unwrap();

        let items = store.items("items").await;
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.get("pk"), Some(&AttributeValue::S("U#42".to_string())));
        assert_eq!(item.get("sk"), None);
        assert_eq!(item.get("id"), Some(&AttributeValue::S("42".to_string())));
        assert_eq!(item.get("age"), Some(&AttributeValue::N("36".to_string())));
    }

    #[tokio::test]
    async fn test_placeholder_sort_key() {
        let (store, table) = setup(|t| t.with_sort_key(ScalarType::String));
        let users = Item::<User>::new(table).unwrap();

        users.put_item(&ada()).await.unwrap();
        assert_eq!(
            store.items("items").await[0].get("sk"),
            Some(&AttributeValue::S("A".to_string()))
        );
        assert_eq!(users.get_item("42", None).await.unwrap(), ada());
    }

    #[tokio::test]
    async fn test_composite_key_round_trip() {
        let (store, table) = setup(|t| t.with_sort_key(ScalarType::String));
        let orders = Item::<Order>::builder(table)
            .partition_key(Key::new("user_id"))
            .sort_key(Key::new("order_id"))
            .build()
            .unwrap();

        let order = Order {
            user_id: "42".to_string(),
            order_id: 7,
            total: 19.5,
            tags: vec!["gift".to_string()],
        };
        orders.put_item(&order).await.unwrap();

        let item = &store.items("items").await[0];
        assert_eq!(item.get("pk"), Some(&AttributeValue::S("O#42".to_string())));
        assert_eq!(item.get("sk"), Some(&AttributeValue::S("OO#7".to_string())));

        let found = orders.get_item("42", Some(KeyValue::from(7_u64))).await.unwrap();
        assert_eq!(found, order);
    }

    #[tokio::test]
    async fn test_unprefixed_numeric_partition_key() {
        let (store, table) = setup(|t| t.with_partition_key(ScalarType::Number));
        let orders = Item::<Order>::builder(table)
            .partition_key(Key::new("order_id").without_prefix())
            .build()
            .unwrap();

        let order = Order {
            user_id: "42".to_string(),
            order_id: 7,
            total: 1.25,
            tags: vec![],
        };
        orders.put_item(&order).await.unwrap();

        assert_eq!(
            store.items("items").await[0].get("pk"),
            Some(&AttributeValue::N("7".to_string()))
        );
        assert_eq!(orders.get_item(7_u64, None).await.unwrap(), order);
        assert_eq!(orders.get_item("7", None).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_item_types_share_a_table() {
        let (store, table) = setup(|t| t);
        let users = Item::<User>::new(Arc::clone(&table)).unwrap();
        let orders = Item::<Order>::new(Arc::clone(&table)).unwrap();

        users.put_item(&ada()).await.unwrap();
        orders
            .put_item(&Order {
                user_id: "42".to_string(),
                order_id: 1,
                total: 3.0,
                tags: vec![],
            })
            .await
            .unwrap();

        assert_eq!(store.items("items").await.len(), 2);
        assert_eq!(users.get_item("42", None).await.unwrap(), ada());
        assert_eq!(orders.get_item("42", None).await.unwrap().order_id, 1);
    }

    #[tokio::test]
    async fn test_get_missing_item_is_not_found() {
        let (_, table) = setup(|t| t);
        let users = Item::<User>::new(table).unwrap();

        let result = users.get_item("nobody", None).await;
        match result {
            Err(Error::NotFound { item_type, key }) => {
                assert_eq!(item_type, "User");
                assert_eq!(key, "pk=U#nobody");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_construction_errors() {
        let (_, table) = setup(|t| t);

        let unknown = Item::<User>::builder(Arc::clone(&table))
            .partition_key(Key::new("uid"))
            .build();
        assert!(matches!(
            unknown,
            Err(Error::Item(ItemError::UnknownAttribute { .. }))
        ));

        let optional = Item::<User>::builder(Arc::clone(&table))
            .partition_key(Key::new("email"))
            .build();
        assert!(matches!(
            optional,
            Err(Error::Item(ItemError::InvalidKeyType { .. }))
        ));

        let no_sort_key = Item::<User>::builder(table)
            .sort_key(Key::new("name"))
            .build();
        assert!(matches!(
            no_sort_key,
            Err(Error::Item(ItemError::IncompatibleKeyConfiguration {
                slot: KeySlot::Sort,
                ..
            }))
        ));
    }

    #[test]
    fn test_failed_construction_leaves_prefixes_untouched() {
        let (_, table) = setup(|t| t.with_partition_key(ScalarType::Number));
        let result = Item::<User>::builder(Arc::clone(&table))
            .partition_key(Key::new("age"))
            .build();
        assert!(result.is_err());
        assert!(table.prefixes().is_empty());
    }

    #[test]
    fn test_failed_sort_key_prefix_leaves_prefixes_untouched() {
        let (_, table) = setup(|t| t.with_sort_key(ScalarType::String));
        table.assign_prefix("Usage", "name").unwrap();
        table.assign_prefix("Unit", "name").unwrap();
        let before = table.prefixes();

        let result = Item::<User>::builder(Arc::clone(&table))
            .partition_key(Key::new("id"))
            .sort_key(Key::new("name"))
            .build();
        assert!(matches!(
            result,
            Err(Error::Item(ItemError::PrefixSpaceExhausted { .. }))
        ));
        assert_eq!(table.prefixes(), before);
    }

    #[test]
    fn test_placeholder_needs_a_string_sort_key() {
        let (_, table) = setup(|t| t.with_sort_key(ScalarType::Number));
        let result = Item::<User>::new(table);
        assert!(matches!(
            result,
            Err(Error::Item(ItemError::IncompatibleKeyConfiguration {
                slot: KeySlot::Sort,
                ..
            }))
        ));
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        at: f64,
        value: i64,
    }

    impl Record for Reading {
        fn schema() -> Schema {
            Schema::new("Reading").required("at").required("value")
        }
    }

    #[tokio::test]
    async fn test_float_keys_round_trip() {
        let (store, table) = setup(|t| t);
        let readings = Item::<Reading>::new(table).unwrap();

        for at in [7.0, 1e20, 0.5] {
            let reading = Reading { at, value: 1 };
            readings.put_item(&reading).await.unwrap();
            assert_eq!(readings.get_item(at, None).await.unwrap(), reading);
        }
        assert!(store
            .items("items")
            .await
            .iter()
            .any(|item| item.get("pk") == Some(&AttributeValue::S("R#7.0".to_string()))));
    }

    #[tokio::test]
    async fn test_unprefixed_float_keys_round_trip() {
        let (_, table) = setup(|t| t.with_partition_key(ScalarType::Number));
        let readings = Item::<Reading>::builder(table)
            .partition_key(Key::new("at").without_prefix())
            .build()
            .unwrap();

        let reading = Reading { at: 7.0, value: 3 };
        readings.put_item(&reading).await.unwrap();
        assert_eq!(readings.get_item(7_i64, None).await.unwrap(), reading);
        assert_eq!(readings.get_item(7.0_f64, None).await.unwrap(), reading);
    }

    #[test]
    fn test_secondary_indexes_are_kept() {
        let (_, table) = setup(|t| t);
        let users = Item::<User>::builder(table)
            .secondary_index(SecondaryIndex::new(Key::new("name")).with_name("by-name"))
            .build()
            .unwrap();
        assert_eq!(users.secondary_indexes().len(), 1);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        struct BrokenStore;

        #[async_trait::async_trait]
        impl ItemStore for BrokenStore {
            async fn put_item(
                &self,
                _table: &str,
                _item: AttributeMap,
            ) -> std::result::Result<(), StoreError> {
                Err(StoreError::ConnectionFailed("offline".to_string()))
            }

            async fn get_item(
                &self,
                table: &str,
                _key: AttributeMap,
            ) -> std::result::Result<Option<AttributeMap>, StoreError> {
                Err(StoreError::TableNotFound(table.to_string()))
            }
        }

        let table = Arc::new(Table::new("items", Arc::new(BrokenStore)));
        let users = Item::<User>::new(table).unwrap();

        assert!(matches!(
            users.put_item(&ada()).await,
            Err(Error::Store(StoreError::ConnectionFailed(_)))
        ));
        assert!(matches!(
            users.get_item("42", None).await,
            Err(Error::Store(StoreError::TableNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_undeserializable_record_is_a_serialization_error() {
        let (store, table) = setup(|t| t);
        let users = Item::<User>::new(table).unwrap();

        let mut item = AttributeMap::new();
        item.insert("pk".to_string(), AttributeValue::S("U#42".to_string()));
        item.insert("id".to_string(), AttributeValue::S("42".to_string()));
        store.put_item("items", item).await.unwrap();

        assert!(matches!(
            users.get_item("42", None).await,
            Err(Error::Serialization(_))
        ));
    }
}
