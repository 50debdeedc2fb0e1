//! Table deployment operations (Imperative Shell).

use super::client;
use super::config::{BillingMode, TableConfig};
use super::error::{DynamodbError, Result};
use super::planning::{self, DeployPlan, DestroyPlan, TableStatus};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode as SdkBillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use dynamo_items_core::ScalarType;
use std::time::Duration;

/// Execute a deploy plan.
pub async fn execute_deploy_plan(client: &Client, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { config } => {
            create_table(client, config).await?;
            wait_for_table_active(client, &config.table_name).await?;
        }
        DeployPlan::KeySchemaMismatch {
            table_name,
            current,
            ..
        } => {
            return Err(DynamodbError::KeySchemaMismatch {
                table_name: table_name.clone(),
                current: planning::format_keys(current),
            });
        }
        DeployPlan::NoChanges { .. } => {
            // Nothing to do
        }
    }
    Ok(())
}

/// Execute a destroy plan.
pub async fn execute_destroy_plan(client: &Client, plan: &DestroyPlan) -> Result<()> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            delete_table(client, table_name).await?;
        }
        DestroyPlan::AlreadyGone { .. } => {
            // Nothing to do
        }
    }
    Ok(())
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

fn attribute_definition(name: &str, scalar: ScalarType) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(to_scalar_type(scalar))
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

async fn create_table(client: &Client, config: &TableConfig) -> Result<()> {
    let mut key_schema = vec![key_element(&config.partition_key.name, KeyType::Hash)?];
    let mut attribute_definitions = vec![attribute_definition(
        &config.partition_key.name,
        config.partition_key.attribute_type,
    )?];

    if let Some(sk) = &config.sort_key {
        key_schema.push(key_element(&sk.name, KeyType::Range)?);
        attribute_definitions.push(attribute_definition(&sk.name, sk.attribute_type)?);
    }

    let billing_mode = match config.billing_mode {
        BillingMode::PayPerRequest => SdkBillingMode::PayPerRequest,
    };

    client
        .create_table()
        .table_name(&config.table_name)
        .set_key_schema(Some(key_schema))
        .set_attribute_definitions(Some(attribute_definitions))
        .billing_mode(billing_mode)
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    Ok(())
}

async fn delete_table(client: &Client, table_name: &str) -> Result<()> {
    client
        .delete_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    Ok(())
}

async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    let max_attempts = 60;
    let delay = Duration::from_secs(2);

    for _ in 0..max_attempts {
        if let Some(state) = client::get_table_state(client, table_name).await? {
            if state.status == TableStatus::Active {
                return Ok(());
            }
        }
        tokio::time::sleep(delay).await;
    }

    Err(DynamodbError::TableActivationTimeout)
}

fn to_scalar_type(attr_type: ScalarType) -> ScalarAttributeType {
    match attr_type {
        ScalarType::String => ScalarAttributeType::S,
        ScalarType::Number => ScalarAttributeType::N,
        ScalarType::Binary => ScalarAttributeType::B,
    }
}
