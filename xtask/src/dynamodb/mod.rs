//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use dynamo_items_core::{ScalarType, TableSchema};

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy DynamoDB table infrastructure.
    Deploy(DeployCommand),
}

/// Deploy or destroy a table.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy DynamoDB table infrastructure.

By default, this command creates the dynamo_items table with a `pk`
partition key and, when --sort-key-type is given, an `sk` sort key.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  DYDB_TABLE_NAME     - Default table name (defaults to dynamo-items)
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the table instead of creating it.
    #[arg(long)]
    pub destroy: bool,

    /// Table name to use (defaults to DYDB_TABLE_NAME).
    #[arg(long)]
    pub table_name: Option<String>,

    /// Scalar type of the partition key (S, N or B).
    #[arg(long, default_value = "S")]
    pub partition_key_type: ScalarType,

    /// Scalar type of the sort key (S, N or B). Omit for a table without one.
    #[arg(long)]
    pub sort_key_type: Option<ScalarType>,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let mut aws_config = dynamo_items::Config::from_env();
    if let Some(name) = &cmd.table_name {
        aws_config = aws_config.with_table_name(name);
    }

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;
    let current_state = client::get_table_state(&dynamo_client, &aws_config.table_name).await?;

    if cmd.destroy {
        // Destroy flow
        let plan = planning::calculate_destroy_plan(current_state.as_ref(), &aws_config.table_name);

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in planning::format_destroy_plan(&plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Are you sure you want to delete this table? ALL DATA WILL BE LOST")
                .default(false)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting table..."));
        }

        deploy::execute_destroy_plan(&dynamo_client, &plan).await?;

        if !global.is_silent() {
            aprintln!("{}", p_g("Table destroyed successfully."));
        }
    } else {
        // Deploy flow
        let mut schema = TableSchema::new(aws_config.table_name.clone())
            .with_partition_key(cmd.partition_key_type);
        if let Some(sort_key_type) = cmd.sort_key_type {
            schema = schema.with_sort_key(sort_key_type);
        }
        let table_config = config::table_config(&schema);

        let plan = planning::calculate_deploy_plan(current_state.as_ref(), &table_config);

        if !global.is_silent() {
            aprintln!("{}", p_c("Deploy Plan:"));
            for line in planning::format_deploy_plan(&plan) {
                if line.starts_with('+') {
                    aprintln!("  {}", p_g(&line));
                } else if line.starts_with('-') {
                    aprintln!("  {}", p_r(&line));
                } else if line.starts_with('~') {
                    aprintln!("  {}", p_y(&line));
                } else {
                    aprintln!("  {}", line);
                }
            }
            aprintln!();
        }

        if let planning::DeployPlan::KeySchemaMismatch {
            table_name,
            current,
            ..
        } = &plan
        {
            return Err(DynamodbError::KeySchemaMismatch {
                table_name: table_name.clone(),
                current: planning::format_keys(current),
            });
        }

        if matches!(plan, planning::DeployPlan::NoChanges { .. }) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Infrastructure is up to date."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Apply these changes?")
                .default(true)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Applying changes..."));
        }

        deploy::execute_deploy_plan(&dynamo_client, &plan).await?;

        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure deployed successfully."));
        }
    }

    Ok(())
}
