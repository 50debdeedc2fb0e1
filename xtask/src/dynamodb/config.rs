//! Table configuration types (Functional Core - pure data).

use dynamo_items_core::keys::{PARTITION_KEY_ATTRIBUTE, SORT_KEY_ATTRIBUTE};
use dynamo_items_core::{ScalarType, TableSchema};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub billing_mode: BillingMode,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: ScalarType,
}

impl std::fmt::Display for KeyAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.attribute_type)
    }
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

/// Returns the physical table configuration for a key schema.
/// This is a pure function - no I/O.
pub fn table_config(schema: &TableSchema) -> TableConfig {
    TableConfig {
        table_name: schema.name.clone(),
        partition_key: KeyAttribute {
            name: PARTITION_KEY_ATTRIBUTE.to_string(),
            attribute_type: schema.partition_key,
        },
        sort_key: schema.sort_key.map(|attribute_type| KeyAttribute {
            name: SORT_KEY_ATTRIBUTE.to_string(),
            attribute_type,
        }),
        billing_mode: BillingMode::PayPerRequest,
    }
}
