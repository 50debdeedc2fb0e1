//! Item key resolution.
//!
//! Validates key definitions against a record schema and a table key schema,
//! resolves prefixes, and builds primary keys for writes and lookups.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{ItemError, Result};
use crate::keys::{
    compose, Key, KeySlot, KeyValue, PrefixRegistry, ResolvedKey, ScalarType, ScalarValue,
    PARTITION_KEY_ATTRIBUTE, PLACEHOLDER_SORT_KEY, SORT_KEY_ATTRIBUTE,
};
use crate::schema::Schema;
use crate::table::TableSchema;

/// A composed primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKey {
    pub pk: ScalarValue,
    pub sk: Option<ScalarValue>,
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sk {
            Some(sk) => write!(
                f,
                "{PARTITION_KEY_ATTRIBUTE}={}, {SORT_KEY_ATTRIBUTE}={sk}",
                self.pk
            ),
            None => write!(f, "{PARTITION_KEY_ATTRIBUTE}={}", self.pk),
        }
    }
}

/// Validated key configuration for one record type on one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemKeys {
    item_type: String,
    table: TableSchema,
    pk: ResolvedKey,
    sk: Option<ResolvedKey>,
}

impl ItemKeys {
    /// Validates `pk`/`sk` against `schema` and `table`, then resolves prefixes.
    ///
    /// Without an explicit partition key the first declared field is used.
    pub fn resolve(
        schema: &Schema,
        pk: Option<Key>,
        sk: Option<Key>,
        table: &TableSchema,
        registry: &mut PrefixRegistry,
    ) -> Result<Self> {
        let item_type = schema.type_name();

        let pk = match pk {
            Some(key) => key,
            None => schema
                .first_field()
                .map(|field| Key::new(field.name.clone()))
                .ok_or_else(|| ItemError::EmptySchema {
                    item_type: item_type.to_string(),
                })?,
        };

        check_attribute(schema, &pk)?;
        if let Some(sk) = &sk {
            check_attribute(schema, sk)?;
        }

        if pk.prefix && table.partition_key != ScalarType::String {
            return Err(ItemError::incompatible(
                KeySlot::Partition,
                format!(
                    "the item uses a prefix but the table partition key is '{}'",
                    table.partition_key
                ),
            ));
        }

        if let Some(sk) = &sk {
            match table.sort_key {
                None => {
                    return Err(ItemError::incompatible(
                        KeySlot::Sort,
                        "the item declares a sort key but the table has none",
                    ))
                }
                Some(scalar) if sk.prefix && scalar != ScalarType::String => {
                    return Err(ItemError::incompatible(
                        KeySlot::Sort,
                        format!("the item uses a prefix but the table sort key is '{scalar}'"),
                    ))
                }
                Some(_) => {}
            }
        } else if let Some(scalar) = table.sort_key.filter(|s| *s != ScalarType::String) {
            return Err(ItemError::incompatible(
                KeySlot::Sort,
                format!(
                    "the item has no sort key, so it writes the placeholder '{PLACEHOLDER_SORT_KEY}', but the table sort key is '{scalar}'"
                ),
            ));
        }

        check_reserved(schema, table)?;

        // Prefixes land in the registry only once both keys resolve.
        let mut staged = registry.clone();
        let pk = resolve_key(item_type, pk, &mut staged)?;
        let sk = sk
            .map(|key| resolve_key(item_type, key, &mut staged))
            .transpose()?;
        *registry = staged;

        Ok(Self {
            item_type: item_type.to_string(),
            table: table.clone(),
            pk,
            sk,
        })
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    pub fn partition_key(&self) -> &ResolvedKey {
        &self.pk
    }

    pub fn sort_key(&self) -> Option<&ResolvedKey> {
        self.sk.as_ref()
    }

    /// Builds the primary key of a serialized record.
    pub fn key_for_record(&self, record: &Map<String, Value>) -> Result<PrimaryKey> {
        let pk = record_value(record, &self.pk, KeySlot::Partition)?;
        let sk = self
            .sk
            .as_ref()
            .map(|key| record_value(record, key, KeySlot::Sort))
            .transpose()?;
        self.key_for_lookup(&pk, sk.as_ref())
    }

    /// Builds the primary key for a point read from raw key values.
    ///
    /// Items without a sort key on a table that has one read and write the
    /// placeholder sort value.
    pub fn key_for_lookup(&self, pk: &KeyValue, sk: Option<&KeyValue>) -> Result<PrimaryKey> {
        let pk = compose(&self.pk, pk, KeySlot::Partition, self.table.partition_key)?;

        let sk = match (&self.sk, sk, self.table.sort_key) {
            (Some(key), Some(raw), Some(scalar)) => Some(compose(key, raw, KeySlot::Sort, scalar)?),
            (Some(_), None, _) => {
                return Err(ItemError::invalid_value(
                    KeySlot::Sort,
                    format!("'{}' requires a sort key value", self.item_type),
                ))
            }
            (None, Some(_), _) => {
                return Err(ItemError::invalid_value(
                    KeySlot::Sort,
                    format!("'{}' does not declare a sort key", self.item_type),
                ))
            }
            (None, None, Some(_)) => Some(ScalarValue::S(PLACEHOLDER_SORT_KEY.to_string())),
            (None, None, None) => None,
            // Resolution rejects sort keys on tables without one.
            (Some(_), Some(_), None) => {
                return Err(ItemError::incompatible(
                    KeySlot::Sort,
                    "the table has no sort key",
                ))
            }
        };

        Ok(PrimaryKey { pk, sk })
    }
}

fn check_attribute(schema: &Schema, key: &Key) -> Result<()> {
    let field = schema
        .field(&key.attr)
        .ok_or_else(|| ItemError::UnknownAttribute {
            item_type: schema.type_name().to_string(),
            attr: key.attr.clone(),
        })?;

    if field.optional {
        return Err(ItemError::InvalidKeyType {
            item_type: schema.type_name().to_string(),
            attr: key.attr.clone(),
        });
    }
    Ok(())
}

fn check_reserved(schema: &Schema, table: &TableSchema) -> Result<()> {
    let mut reserved = vec![KeySlot::Partition];
    if table.sort_key.is_some() {
        reserved.push(KeySlot::Sort);
    }

    for slot in reserved {
        if schema.field(slot.attribute()).is_some() {
            return Err(ItemError::ReservedAttribute {
                item_type: schema.type_name().to_string(),
                attr: slot.attribute().to_string(),
                slot,
            });
        }
    }
    Ok(())
}

fn resolve_key(item_type: &str, key: Key, registry: &mut PrefixRegistry) -> Result<ResolvedKey> {
    let prefix = match (key.prefix, key.prefix_value) {
        (false, _) => None,
        (true, Some(explicit)) => {
            registry.reserve(item_type, &key.attr, &explicit)?;
            Some(explicit)
        }
        (true, None) => Some(registry.assign(item_type, &key.attr)?),
    };

    Ok(ResolvedKey {
        attr: key.attr,
        prefix,
        separator: key.separator,
    })
}

fn record_value(record: &Map<String, Value>, key: &ResolvedKey, slot: KeySlot) -> Result<KeyValue> {
    let value = record
        .get(&key.attr)
        .ok_or_else(|| ItemError::invalid_value(slot, format!("'{}' is missing", key.attr)))?;
    KeyValue::from_json(value, slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Schema {
        Schema::new("User")
            .required("id")
            .required("name")
            .required("age")
            .optional("email")
    }

    fn resolve(
        pk: Option<Key>,
        sk: Option<Key>,
        table: &TableSchema,
    ) -> (Result<ItemKeys>, PrefixRegistry) {
        let mut registry = PrefixRegistry::new();
        let keys = ItemKeys::resolve(&user_schema(), pk, sk, table, &mut registry);
        (keys, registry)
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_partition_key_defaults_to_first_field() {
        let (keys, _) = resolve(None, None, &TableSchema::new("t"));
        let keys = keys.unwrap();
        assert_eq!(keys.partition_key().attr, "id");
        assert_eq!(keys.partition_key().prefix.as_deref(), Some("U"));
    }

    #[test]
    fn test_every_required_field_can_be_the_partition_key() {
        for attr in ["id", "name", "age"] {
            let (keys, _) = resolve(Some(Key::new(attr)), None, &TableSchema::new("t"));
            assert!(keys.is_ok(), "{attr} should be a valid key");
        }
    }

    #[test]
    fn test_empty_schema() {
        let mut registry = PrefixRegistry::new();
        let result = ItemKeys::resolve(
            &Schema::new("Nothing"),
            None,
            None,
            &TableSchema::new("t"),
            &mut registry,
        );
        assert_eq!(
            result,
            Err(ItemError::EmptySchema {
                item_type: "Nothing".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_partition_attribute() {
        let (keys, _) = resolve(Some(Key::new("uid")), None, &TableSchema::new("t"));
        assert_eq!(
            keys,
            Err(ItemError::UnknownAttribute {
                item_type: "User".to_string(),
                attr: "uid".to_string()
            })
        );
    }

    #[test]
    fn test_optional_partition_attribute() {
        let (keys, _) = resolve(Some(Key::new("email")), None, &TableSchema::new("t"));
        assert_eq!(
            keys,
            Err(ItemError::InvalidKeyType {
                item_type: "User".to_string(),
                attr: "email".to_string()
            })
        );
    }

    #[test]
    fn test_sort_key_attribute_checks() {
        let table = TableSchema::new("t").with_sort_key(ScalarType::String);
        let (unknown, _) = resolve(None, Some(Key::new("nope")), &table);
        assert!(matches!(unknown, Err(ItemError::UnknownAttribute { .. })));

        let (optional, _) = resolve(None, Some(Key::new("email")), &table);
        assert!(matches!(optional, Err(ItemError::InvalidKeyType { .. })));
    }

    #[test]
    fn test_attribute_checks_run_before_table_checks() {
        let table = TableSchema::new("t").with_partition_key(ScalarType::Number);
        let (keys, _) = resolve(Some(Key::new("email")), None, &table);
        assert!(matches!(keys, Err(ItemError::InvalidKeyType { .. })));
    }

    #[test]
    fn test_prefix_requires_string_partition_key() {
        let table = TableSchema::new("t").with_partition_key(ScalarType::Number);
        let (keys, registry) = resolve(Some(Key::new("age")), None, &table);
        assert!(matches!(
            keys,
            Err(ItemError::IncompatibleKeyConfiguration {
                slot: KeySlot::Partition,
                ..
            })
        ));
        assert!(!registry.is_issued("U"));

        let (keys, _) = resolve(Some(Key::new("age").without_prefix()), None, &table);
        assert!(keys.is_ok());
    }

    #[test]
    fn test_prefix_requires_string_sort_key() {
        let table = TableSchema::new("t").with_sort_key(ScalarType::Number);
        let (keys, _) = resolve(None, Some(Key::new("age")), &table);
        assert!(matches!(
            keys,
            Err(ItemError::IncompatibleKeyConfiguration {
                slot: KeySlot::Sort,
                ..
            })
        ));
    }

    #[test]
    fn test_sort_key_requires_table_sort_key() {
        let (keys, _) = resolve(None, Some(Key::new("name").without_prefix()), &TableSchema::new("t"));
        assert!(matches!(
            keys,
            Err(ItemError::IncompatibleKeyConfiguration {
                slot: KeySlot::Sort,
                ..
            })
        ));
    }

    #[test]
    fn test_reserved_attribute_names() {
        let schema = Schema::new("Raw").required("id").required("pk");
        let mut registry = PrefixRegistry::new();
        let result = ItemKeys::resolve(&schema, None, None, &TableSchema::new("t"), &mut registry);
        assert!(matches!(
            result,
            Err(ItemError::ReservedAttribute {
                slot: KeySlot::Partition,
                ..
            })
        ));

        // `sk` is only reserved when the table has a sort key.
        let schema = Schema::new("Raw").required("id").required("sk");
        assert!(ItemKeys::resolve(&schema, None, None, &TableSchema::new("t"), &mut registry).is_ok());
        let table = TableSchema::new("t").with_sort_key(ScalarType::String);
        assert!(ItemKeys::resolve(&schema, None, None, &table, &mut registry).is_err());
    }

    #[test]
    fn test_explicit_prefix_is_reserved() {
        let (keys, registry) = resolve(
            Some(Key::new("id").with_prefix_value("USR")),
            None,
            &TableSchema::new("t"),
        );
        assert_eq!(keys.unwrap().partition_key().prefix.as_deref(), Some("USR"));
        assert!(registry.is_issued("USR"));
        assert_eq!(registry.get("User", "id"), None);
    }

    #[test]
    fn test_explicit_prefix_held_by_another_item_is_rejected() {
        let table = TableSchema::new("t");
        let mut registry = PrefixRegistry::new();
        ItemKeys::resolve(&user_schema(), None, None, &table, &mut registry).unwrap();

        let order = Schema::new("Order").required("id");
        let result = ItemKeys::resolve(
            &order,
            Some(Key::new("id").with_prefix_value("U")),
            None,
            &table,
            &mut registry,
        );
        assert!(matches!(result, Err(ItemError::PrefixInUse { .. })));
    }

    #[test]
    fn test_failed_sort_key_prefix_rolls_back_partition_prefix() {
        let table = TableSchema::new("t").with_sort_key(ScalarType::String);
        let mut registry = PrefixRegistry::new();
        registry.assign("Usage", "a").unwrap();
        registry.assign("Unit", "a").unwrap();
        let before = registry.clone();

        let schema = Schema::new("User").required("id").required("a");
        let result = ItemKeys::resolve(
            &schema,
            Some(Key::new("id")),
            Some(Key::new("a")),
            &table,
            &mut registry,
        );
        assert!(matches!(result, Err(ItemError::PrefixSpaceExhausted { .. })));
        assert_eq!(registry.get("User", "id"), None);
        assert_eq!(
            registry.assignments().count(),
            before.assignments().count()
        );
    }

    #[test]
    fn test_placeholder_requires_string_sort_key() {
        for scalar in [ScalarType::Number, ScalarType::Binary] {
            let table = TableSchema::new("t").with_sort_key(scalar);
            let (keys, registry) = resolve(None, None, &table);
            assert!(matches!(
                keys,
                Err(ItemError::IncompatibleKeyConfiguration {
                    slot: KeySlot::Sort,
                    ..
                })
            ));
            assert!(!registry.is_issued("U"));
        }
    }

    #[test]
    fn test_unprefixed_key_does_not_consume_a_prefix() {
        let (keys, registry) = resolve(Some(Key::new("id").without_prefix()), None, &TableSchema::new("t"));
        assert_eq!(keys.unwrap().partition_key().prefix, None);
        assert!(!registry.is_issued("U"));
    }

    #[test]
    fn test_sort_key_gets_its_own_prefix() {
        let table = TableSchema::new("t").with_sort_key(ScalarType::String);
        let (keys, _) = resolve(Some(Key::new("id")), Some(Key::new("name")), &table);
        let keys = keys.unwrap();
        assert_eq!(keys.partition_key().prefix.as_deref(), Some("U"));
        assert_eq!(keys.sort_key().and_then(|k| k.prefix.as_deref()), Some("UN"));
    }

    #[test]
    fn test_key_for_record() {
        let (keys, _) = resolve(None, None, &TableSchema::new("t"));
        let record = as_map(json!({"id": "42", "name": "Ada", "age": 36}));
        let key = keys.unwrap().key_for_record(&record).unwrap();
        assert_eq!(key.pk, ScalarValue::S("U#42".to_string()));
        assert_eq!(key.sk, None);
        assert_eq!(key.to_string(), "pk=U#42");
    }

    #[test]
    fn test_placeholder_sort_key() {
        let table = TableSchema::new("t").with_sort_key(ScalarType::String);
        let (keys, _) = resolve(None, None, &table);
        let keys = keys.unwrap();

        let record = as_map(json!({"id": "42", "name": "Ada", "age": 36}));
        let write = keys.key_for_record(&record).unwrap();
        let read = keys.key_for_lookup(&KeyValue::from("42"), None).unwrap();
        assert_eq!(write.sk, Some(ScalarValue::S("A".to_string())));
        assert_eq!(write, read);
    }

    #[test]
    fn test_unprefixed_numeric_keys() {
        let table = TableSchema::new("t")
            .with_partition_key(ScalarType::Number)
            .with_sort_key(ScalarType::Number);
        let (keys, _) = resolve(
            Some(Key::new("age").without_prefix()),
            Some(Key::new("id").without_prefix()),
            &table,
        );
        let keys = keys.unwrap();
        let record = as_map(json!({"id": "7", "name": "Ada", "age": 36}));
        let key = keys.key_for_record(&record).unwrap();
        assert_eq!(key.pk, ScalarValue::N("36".to_string()));
        assert_eq!(key.sk, Some(ScalarValue::N("7".to_string())));
    }

    #[test]
    fn test_lookup_sort_key_mismatches() {
        let plain = TableSchema::new("t").with_sort_key(ScalarType::String);
        let (keys, _) = resolve(None, None, &plain);
        let result = keys
            .unwrap()
            .key_for_lookup(&KeyValue::from("1"), Some(&KeyValue::from("x")));
        assert!(matches!(result, Err(ItemError::InvalidKeyValue { slot: KeySlot::Sort, .. })));

        let (keys, _) = resolve(None, Some(Key::new("name")), &plain);
        let result = keys.unwrap().key_for_lookup(&KeyValue::from("1"), None);
        assert!(matches!(result, Err(ItemError::InvalidKeyValue { slot: KeySlot::Sort, .. })));
    }

    #[test]
    fn test_missing_or_null_key_value_in_record() {
        let (keys, _) = resolve(None, None, &TableSchema::new("t"));
        let keys = keys.unwrap();
        let missing = as_map(json!({"name": "Ada"}));
        let null = as_map(json!({"id": null}));
        assert!(matches!(
            keys.key_for_record(&missing),
            Err(ItemError::InvalidKeyValue { slot: KeySlot::Partition, .. })
        ));
        assert!(matches!(
            keys.key_for_record(&null),
            Err(ItemError::InvalidKeyValue { slot: KeySlot::Partition, .. })
        ));
    }
}
