//! Pure functions for calculating deployment plans (Functional Core).

use super::config::{KeyAttribute, TableConfig};

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    /// Key attributes with their scalar types: partition key first, then the
    /// sort key if any.
    pub keys: Vec<KeyAttribute>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists with a different key schema. Keys cannot be altered in place.
    KeySchemaMismatch {
        table_name: String,
        current: Vec<KeyAttribute>,
        desired: Vec<KeyAttribute>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

fn desired_keys(config: &TableConfig) -> Vec<KeyAttribute> {
    std::iter::once(config.partition_key.clone())
        .chain(config.sort_key.clone())
        .collect()
}

/// Joins key attributes for display, e.g. `pk (S), sk (N)`.
pub fn format_keys(keys: &[KeyAttribute]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    match current {
        None => DeployPlan::CreateTable {
            config: desired.clone(),
        },
        Some(state) => {
            let desired_keys = desired_keys(desired);
            if state.keys == desired_keys {
                DeployPlan::NoChanges {
                    table_name: desired.table_name.clone(),
                }
            } else {
                DeployPlan::KeySchemaMismatch {
                    table_name: desired.table_name.clone(),
                    current: state.keys.clone(),
                    desired: desired_keys,
                }
            }
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!(
                    "  Partition key: {} ({})",
                    config.partition_key.name, config.partition_key.attribute_type
                ),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {} ({})", sk.name, sk.attribute_type));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::KeySchemaMismatch {
            table_name,
            current,
            desired,
        } => vec![
            format!("~ Table '{}' has a different key schema", table_name),
            format!("  Current keys: {}", format_keys(current)),
            format!("  Desired keys: {}", format_keys(desired)),
        ],
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}
