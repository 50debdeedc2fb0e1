use std::env;

/// Environment variable naming the default table.
pub const TABLE_NAME_ENV: &str = "DYDB_TABLE_NAME";

/// Table name used when `DYDB_TABLE_NAME` is unset.
pub const DEFAULT_TABLE_NAME: &str = "dynamo-items";

/// Configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the default table (default: "dynamo-items")
    pub table_name: String,
    /// Custom endpoint URL, e.g. a local DynamoDB
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYDB_TABLE_NAME` - Default table name (default: "dynamo-items")
    /// - `AWS_ENDPOINT_URL` - Custom DynamoDB endpoint (optional)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    pub fn from_env() -> Self {
        Self {
            table_name: env::var(TABLE_NAME_ENV).unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string()),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        }
    }

    /// Sets the table name.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
