//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod connector;
mod pipeline;
mod stream;
mod topic;
mod transform;
mod workspace;

pub use connector::ConnectorCommands;
pub use pipeline::PipelineCommands;
pub use stream::StreamCommands;
pub use topic::TopicCommands;
pub use transform::TransformCommands;
pub use workspace::WorkspaceCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use conduit_core::domain::pipeline::Pipeline;
use serde::de::DeserializeOwned;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Workspace management
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },
    /// Pipeline management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Edit the streams of a pipeline
    Stream {
        #[command(subcommand)]
        command: StreamCommands,
    },
    /// Edit the source and sink connectors of a pipeline
    Connector {
        #[command(subcommand)]
        command: ConnectorCommands,
    },
    /// Edit the transforms of a pipeline
    Transform {
        #[command(subcommand)]
        command: TransformCommands,
    },
    /// Encode and decode wire names
    Topic {
        #[command(subcommand)]
        command: TopicCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Workspace { command } => {
            workspace::handle_workspace_command(command, config).await
        }
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Stream { command } => stream::handle_stream_command(command, config).await,
        Commands::Connector { command } => {
            connector::handle_connector_command(command, config).await
        }
        Commands::Transform { command } => {
            transform::handle_transform_command(command, config).await
        }
        Commands::Topic { command } => topic::handle_topic_command(command, config).await,
    }
}

/// Read and parse a JSON file given on the command line
fn read_json_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON in {}", path))
}

/// Print the outcome of a committed graph edit
fn print_committed(message: &str, pipeline: &Pipeline) {
    println!("{}", format!("✓ {}", message).green().bold());
    println!(
        "  Pipeline: {} ({})",
        pipeline.name.bold(),
        pipeline.code.cyan()
    );
    println!(
        "  Graph:    {} streams, {} source connectors, {} sink connectors, {} transforms",
        pipeline.streams.len(),
        pipeline.source_connectors.len(),
        pipeline.sink_connectors.len(),
        pipeline.transforms.len()
    );
    println!(
        "  Revision: {}",
        pipeline.revision.to_string().dimmed()
    );
}
