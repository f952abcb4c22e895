//! Workspace command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use conduit_client::ControlClient;
use conduit_core::domain::workspace::Workspace;
use conduit_core::dto::workspace::CreateWorkspace;

use crate::config::Config;
use crate::id_resolver::resolve_workspace_id;
use crate::types::IdOrPrefix;

/// Workspace subcommands
#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// Create a new workspace
    Create {
        /// Workspace name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Allowed browser origins (comma-separated)
        #[arg(long, value_delimiter = ',')]
        origins: Vec<String>,
    },
    /// List all workspaces
    List,
    /// Get workspace details
    Get {
        /// Workspace ID, code, or unambiguous ID prefix
        id: String,
    },
    /// List the pipelines of a workspace
    Pipelines {
        /// Workspace ID, code, or unambiguous ID prefix
        id: String,
    },
}

pub async fn handle_workspace_command(command: WorkspaceCommands, config: &Config) -> Result<()> {
    let client = ControlClient::new(&config.control_url);

    match command {
        WorkspaceCommands::Create {
            name,
            description,
            origins,
        } => {
            let workspace = client
                .create_workspace(CreateWorkspace {
                    name,
                    description,
                    allowed_origins: origins,
                })
                .await?;

            println!("{}", "✓ Workspace created successfully!".green().bold());
            println!("  ID:   {}", workspace.id.to_string().cyan());
            println!("  Code: {}", workspace.code.bold());
            println!("  Name: {}", workspace.name);
            Ok(())
        }
        WorkspaceCommands::List => {
            let workspaces = client.list_workspaces().await?;

            if workspaces.is_empty() {
                println!("{}", "No workspaces found.".yellow());
            } else {
                println!(
                    "{}",
                    format!("Found {} workspace(s):", workspaces.len()).bold()
                );
                println!();
                for workspace in &workspaces {
                    print_workspace_summary(workspace);
                }
            }
            Ok(())
        }
        WorkspaceCommands::Get { id } => {
            let uuid = resolve_workspace_id(&client, &IdOrPrefix::parse(&id)).await?;
            let workspace = client.get_workspace(uuid).await?;

            print_workspace_summary(&workspace);
            if !workspace.allowed_origins.is_empty() {
                println!("    Origins: {}", workspace.allowed_origins.join(", "));
            }
            Ok(())
        }
        WorkspaceCommands::Pipelines { id } => {
            let uuid = resolve_workspace_id(&client, &IdOrPrefix::parse(&id)).await?;
            let pipelines = client.list_workspace_pipelines(uuid).await?;

            if pipelines.is_empty() {
                println!("{}", "No pipelines in this workspace.".yellow());
            }
            for pipeline in pipelines {
                println!(
                    "  {} {} {} {}",
                    "▸".cyan(),
                    pipeline.code.bold(),
                    pipeline.name,
                    format!("[{}]", pipeline.status).dimmed()
                );
            }
            Ok(())
        }
    }
}

fn print_workspace_summary(workspace: &Workspace) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        workspace.code.bold(),
        workspace.name
    );
    println!("    ID:      {}", workspace.id.to_string().dimmed());
    println!("    Status:  {}", workspace.status);
    if !workspace.description.is_empty() {
        println!("    Description: {}", workspace.description.dimmed());
    }
    println!();
}
