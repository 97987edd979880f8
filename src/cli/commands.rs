//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap
//! and dispatches each command to the linked storage account manager.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::provider::AuthProviderFactory;
use crate::config::{Config, StateStore};
use crate::error::Result;
use crate::linked_storage::{
    AzureLinkedStorageAccountsClient, LinkedStorageAccountManager, LinkedStorageAccountResource,
    LinkedStorageAccountRow, Plan, ResourceData,
};
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};

#[derive(Parser)]
#[command(name = "lalink")]
#[command(about = "Manage Log Analytics linked storage accounts")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to the state file (overrides configuration)
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Desired configuration of a linked storage account
#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Data source type (customlogs, azurewatson, query, alerts, ingestion)
    #[arg(long)]
    pub data_source_type: String,

    /// Resource group holding the workspace
    #[arg(long)]
    pub resource_group: String,

    /// Workspace resource ID
    #[arg(long)]
    pub workspace_id: String,

    /// Storage account resource ID (repeatable)
    #[arg(long = "storage-account-id", required = true)]
    pub storage_account_ids: Vec<String>,
}

impl ResourceArgs {
    fn into_resource_data(self) -> ResourceData {
        ResourceData::new(
            self.data_source_type,
            self.resource_group,
            self.workspace_id,
            self.storage_account_ids,
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what apply would do
    Plan {
        /// Local name of the resource
        name: String,
        #[command(flatten)]
        resource: ResourceArgs,
    },
    /// Create or update a linked storage account
    Apply {
        /// Local name of the resource
        name: String,
        #[command(flatten)]
        resource: ResourceArgs,
    },
    /// Refresh a linked storage account from Azure and show it
    Show {
        /// Local name of the resource
        name: String,
    },
    /// Delete a linked storage account
    Destroy {
        /// Local name of the resource
        name: String,
    },
    /// Start managing an existing linked storage account
    Import {
        /// Local name to track the resource under
        name: String,
        /// Linked storage account resource ID
        id: String,
    },
    /// Inspect local state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// List managed resources
    List,
}

impl Cli {
    pub async fn execute(self, mut config: Config) -> Result<()> {
        if let Some(path) = self.state {
            config.state_path = Some(path);
        }
        config.no_color |= self.no_color;
        let format = if config.output_json {
            OutputFormat::Json
        } else {
            self.format
        };

        let store = StateStore::load(config.resolve_state_path()?).await?;
        let output = Output::new(format, config.no_color);

        if let Commands::State {
            command: StateCommands::List,
        } = &self.command
        {
            let rows: Vec<LinkedStorageAccountRow> = store
                .entries()
                .map(|(name, entry)| entry.data.to_row(name))
                .collect();
            return output.rows(&rows);
        }

        let mut manager = build_manager(&config, store)?;

        match self.command {
            Commands::Plan { name, resource } => {
                let plan = manager.plan(&name, &resource.into_resource_data())?;
                output.plan(&name, &plan)
            }
            Commands::Apply { name, resource } => {
                let outcome = manager.apply(&name, resource.into_resource_data()).await?;
                match outcome.state {
                    Some(data) => {
                        output.display.print_success(&format!("Applied '{}'", name))?;
                        output.detail(&name, &data)
                    }
                    None => output.display.print_warning(&format!(
                        "'{}' disappeared right after apply and was removed from state",
                        name
                    )),
                }
            }
            Commands::Show { name } => match manager.refresh(&name).await? {
                Some(data) => output.detail(&name, &data),
                None => output.display.print_warning(&format!(
                    "'{}' no longer exists in Azure and was removed from state",
                    name
                )),
            },
            Commands::Destroy { name } => {
                manager.destroy(&name).await?;
                output.display.print_success(&format!("Destroyed '{}'", name))
            }
            Commands::Import { name, id } => {
                let data = manager.import(&name, &id).await?;
                output.display.print_success(&format!("Imported '{}'", name))?;
                output.detail(&name, &data)
            }
            Commands::State { .. } => Ok(()),
        }
    }
}

fn build_manager(config: &Config, store: StateStore) -> Result<LinkedStorageAccountManager> {
    let auth_provider = AuthProviderFactory::from_config(config)?;
    let client = AzureLinkedStorageAccountsClient::new(auth_provider, config)?;
    let resource = LinkedStorageAccountResource::new(Arc::new(client), config.timeouts.clone());
    Ok(LinkedStorageAccountManager::new(resource, store))
}

struct Output {
    format: OutputFormat,
    display: DisplayUtils,
    formatter: TableFormatter,
}

impl Output {
    fn new(format: OutputFormat, no_color: bool) -> Self {
        Self {
            format,
            display: DisplayUtils::new(no_color),
            formatter: TableFormatter::new(format, no_color),
        }
    }

    fn rows(&self, rows: &[LinkedStorageAccountRow]) -> Result<()> {
        if rows.is_empty() && self.format == OutputFormat::Table {
            return self.display.print_info("No linked storage accounts are managed.");
        }
        println!("{}", self.formatter.format_table(rows)?);
        Ok(())
    }

    fn detail(&self, name: &str, data: &ResourceData) -> Result<()> {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(data)?);
            return Ok(());
        }

        let accounts: Vec<&str> = data.storage_account_ids.iter().map(String::as_str).collect();
        let pairs = vec![
            ("Name", name.to_string()),
            ("ID", data.id.clone().unwrap_or_default()),
            ("Data Source Type", data.data_source_type.clone()),
            ("Resource Group", data.resource_group_name.clone()),
            ("Workspace", data.workspace_resource_id.clone()),
            ("Storage Accounts", accounts.join("\n                  ")),
        ];
        println!("{}", self.display.format_key_value_pairs(&pairs));
        Ok(())
    }

    fn plan(&self, name: &str, plan: &Plan) -> Result<()> {
        let message = match plan {
            Plan::Create => format!("'{}' will be created", name),
            Plan::Update => format!("'{}' will be updated in place", name),
            Plan::Replace { fields } => format!(
                "'{}' must be replaced ({} cannot change in place)",
                name,
                fields.join(", ")
            ),
            Plan::NoOp => format!("'{}' is up to date", name),
        };
        self.display.print_info(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_collects_repeated_storage_accounts() {
        let cli = Cli::try_parse_from([
            "lalink",
            "apply",
            "logs",
            "--data-source-type",
            "customlogs",
            "--resource-group",
            "G",
            "--workspace-id",
            "/subscriptions/S/resourceGroups/G/providers/Microsoft.OperationalInsights/workspaces/W",
            "--storage-account-id",
            "/subscriptions/S/a/A",
            "--storage-account-id",
            "/subscriptions/S/a/B",
        ])
        .unwrap();

        match cli.command {
            Commands::Apply { name, resource } => {
                assert_eq!(name, "logs");
                let data = resource.into_resource_data();
                assert_eq!(data.storage_account_ids.len(), 2);
                assert!(data.is_new_resource());
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_apply_requires_a_storage_account() {
        let result = Cli::try_parse_from([
            "lalink",
            "apply",
            "logs",
            "--data-source-type",
            "query",
            "--resource-group",
            "G",
            "--workspace-id",
            "/ws",
        ]);
        assert!(result.is_err());
    }
}
