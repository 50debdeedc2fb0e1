//! AWS SDK client setup (Imperative Shell).

use super::config::KeyAttribute;
use super::error::{DynamodbError, Result};
use super::planning::{TableState, TableStatus};
use aws_sdk_dynamodb::types::{KeyType, ScalarAttributeType, TableDescription};
use aws_sdk_dynamodb::Client;
use dynamo_items::{Config, DynamoDbStore};
use dynamo_items_core::ScalarType;

/// Creates a DynamoDB client with the given configuration.
pub async fn create_client(config: &Config) -> Client {
    DynamoDbStore::from_config(config).await.client().clone()
}

/// Fetches current table state, returns None if table doesn't exist.
pub async fn get_table_state(client: &Client, table_name: &str) -> Result<Option<TableState>> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(response) => {
            let Some(table) = response.table() else {
                return Err(DynamodbError::AwsSdk(format!(
                    "DescribeTable returned no table for '{}'",
                    table_name
                )));
            };

            let keys = key_attributes(table)?;

            // Parse table status
            let status = match table.table_status() {
                Some(aws_sdk_dynamodb::types::TableStatus::Active) => TableStatus::Active,
                Some(aws_sdk_dynamodb::types::TableStatus::Creating) => TableStatus::Creating,
                Some(aws_sdk_dynamodb::types::TableStatus::Updating) => TableStatus::Updating,
                Some(aws_sdk_dynamodb::types::TableStatus::Deleting) => TableStatus::Deleting,
                _ => TableStatus::Active,
            };

            Ok(Some(TableState { status, keys }))
        }
        Err(err) => {
            let err_str = err.to_string();
            let service_err = err
                .as_service_error()
                .map(|e| e.is_resource_not_found_exception())
                .unwrap_or(false);
            // Check if it's a ResourceNotFoundException
            if service_err
                || err_str.contains("ResourceNotFoundException")
                || err_str.contains("not found")
            {
                Ok(None)
            } else {
                Err(DynamodbError::AwsSdk(err_str))
            }
        }
    }
}

/// Key attributes of a described table, partition key first, typed from its
/// attribute definitions.
fn key_attributes(table: &TableDescription) -> Result<Vec<KeyAttribute>> {
    let mut key_schema: Vec<_> = table.key_schema().iter().collect();
    key_schema.sort_by_key(|k| !matches!(k.key_type(), KeyType::Hash));

    key_schema
        .iter()
        .map(|k| {
            let name = k.attribute_name();
            let attribute_type = table
                .attribute_definitions()
                .iter()
                .find(|d| d.attribute_name() == name)
                .and_then(|d| from_sdk_scalar(d.attribute_type()))
                .ok_or_else(|| {
                    DynamodbError::AwsSdk(format!("No scalar type defined for key '{}'", name))
                })?;
            Ok(KeyAttribute {
                name: name.to_string(),
                attribute_type,
            })
        })
        .collect()
}

fn from_sdk_scalar(attr_type: &ScalarAttributeType) -> Option<ScalarType> {
    match attr_type {
        ScalarAttributeType::S => Some(ScalarType::String),
        ScalarAttributeType::N => Some(ScalarType::Number),
        ScalarAttributeType::B => Some(ScalarType::Binary),
        _ => None,
    }
}
