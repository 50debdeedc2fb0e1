//! Stores and reads back a couple of records through one table.
//!
//! ```bash
//! cargo run -p dynamo_items --example users
//! AWS_ENDPOINT_URL=http://localhost:8000 cargo run -p dynamo_items --example users -- --dynamodb
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dynamo_items::{
    Config, DynamoDbStore, Error, InMemoryStore, Item, ItemStore, Key, KeyValue, Record,
    ScalarType, Schema, Table,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// dynamo_items demo
#[derive(Parser, Debug)]
#[command(name = "users")]
struct Cli {
    /// Use DynamoDB (see DYDB_TABLE_NAME, AWS_ENDPOINT_URL, AWS_REGION)
    #[arg(long)]
    dynamodb: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
    email: Option<String>,
}

impl Record for User {
    fn schema() -> Schema {
        Schema::new("User")
            .required("id")
            .required("name")
            .optional("email")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    user_id: String,
    order_id: u64,
    total: f64,
}

impl Record for Order {
    fn schema() -> Schema {
        Schema::new("Order")
            .required("user_id")
            .required("order_id")
            .required("total")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynamo_items=debug,users=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let store: Arc<dyn ItemStore> = if cli.dynamodb {
        tracing::info!("Using {}", config.target_display());
        Arc::new(DynamoDbStore::from_config(&config).await)
    } else {
        Arc::new(InMemoryStore::new())
    };

    let table = Arc::new(Table::from_config(&config, store).with_sort_key(ScalarType::String));

    let users = Item::<User>::new(Arc::clone(&table))?;
    let orders = Item::<Order>::builder(Arc::clone(&table))
        .partition_key(Key::new("user_id"))
        .sort_key(Key::new("order_id"))
        .build()?;

    for (item, prefix) in table.prefixes() {
        tracing::info!(%item, %prefix, "Prefix assigned");
    }

    users
        .put_item(&User {
            id: "42".to_string(),
            name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
        })
        .await?;
    orders
        .put_item(&Order {
            user_id: "42".to_string(),
            order_id: 1,
            total: 19.5,
        })
        .await?;

    let user = users.get_item("42", None).await?;
    let order = orders.get_item("42", Some(KeyValue::from(1_u64))).await?;
    tracing::info!(?user, ?order, "Read back");

    match users.get_item("nobody", None).await {
        Err(Error::NotFound { key, .. }) => tracing::info!(%key, "Missing user reported"),
        other => tracing::warn!(?other, "Unexpected result for a missing user"),
    }

    Ok(())
}
