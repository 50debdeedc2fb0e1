//! DynamoDB store backend.
//!
//! Forwards puts and point reads to `aws-sdk-dynamodb`. No conditional writes,
//! retries or consistency options are layered on top of the SDK.

mod error;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;

use super::{AttributeMap, ItemStore, StoreError};
use crate::config::Config;
use error::{map_get_item_error, map_put_item_error};

/// DynamoDB-based store.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a store over an existing DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store from configuration.
    ///
    /// Uses the AWS SDK default credential chain, the configured region and,
    /// when set, a custom endpoint such as a local DynamoDB.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        tracing::debug!(target_env = %config.target_display(), "DynamoDB client configured");
        Self::new(Client::new(&sdk_config))
    }

    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ItemStore for DynamoDbStore {
    async fn put_item(&self, table: &str, item: AttributeMap) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| {
                let err = map_put_item_error(e, table);
                tracing::warn!(table, error = %err, "PutItem failed");
                err
            })?;

        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: AttributeMap,
    ) -> Result<Option<AttributeMap>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| {
                let err = map_get_item_error(e, table);
                tracing::warn!(table, error = %err, "GetItem failed");
                err
            })?;

        Ok(result.item)
    }
}
