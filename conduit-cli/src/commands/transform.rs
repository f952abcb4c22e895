//! Transform command handlers

use anyhow::Result;
use clap::Subcommand;
use conduit_client::ControlClient;
use conduit_core::domain::pipeline::{Transform, TransformKind};
use conduit_core::dto::pipeline::UpdateTransform;

use crate::commands::{print_committed, read_json_file};
use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::types::IdOrPrefix;

/// Transform subcommands
#[derive(Subcommand)]
pub enum TransformCommands {
    /// Add a JSONata transform between two streams
    Add {
        /// Pipeline ID, code, or unambiguous ID prefix
        pipeline: String,

        /// Source stream name
        #[arg(short, long)]
        source: String,

        /// Target stream name (sink preferred, dlq or replay accepted)
        #[arg(short, long)]
        target: String,

        /// Dead-letter stream for failed records
        #[arg(short, long)]
        failure_queue: Option<String>,

        /// JSONata expression, or @path to read it from a file
        #[arg(short, long)]
        expression: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change the transform at a position
    Update {
        pipeline: String,

        index: usize,

        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long)]
        target: Option<String>,

        #[arg(short, long)]
        failure_queue: Option<String>,

        /// Stop routing failures to a dead-letter stream
        #[arg(long, conflicts_with = "failure_queue")]
        no_failure_queue: bool,

        /// JSONata expression, or @path to read it from a file
        #[arg(short, long)]
        expression: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Pause the transform at a position
    Pause { pipeline: String, index: usize },
    /// Resume the transform at a position
    Resume { pipeline: String, index: usize },
    /// Replace all transforms with the JSON array in a file
    Replace {
        pipeline: String,

        #[arg(short, long)]
        file: String,
    },
}

/// Expand `@path` into the file's contents
fn expression_arg(raw: String) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(raw),
    }
}

pub async fn handle_transform_command(command: TransformCommands, config: &Config) -> Result<()> {
    let client = ControlClient::new(&config.control_url);

    let (message, pipeline) = match command {
        TransformCommands::Add {
            pipeline,
            source,
            target,
            failure_queue,
            expression,
            description,
        } => {
            let transform = Transform {
                kind: TransformKind::Jsonata,
                source_stream: source,
                target_stream: target,
                failure_queue,
                expression: expression_arg(expression)?,
                description,
                is_paused: false,
            };
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            (
                "Transform added successfully!",
                client.add_transform(uuid, transform).await?,
            )
        }
        TransformCommands::Update {
            pipeline,
            index,
            source,
            target,
            failure_queue,
            no_failure_queue,
            expression,
            description,
        } => {
            let req = UpdateTransform {
                source_stream: source,
                target_stream: target,
                failure_queue: if no_failure_queue {
                    Some(None)
                } else {
                    failure_queue.map(Some)
                },
                expression: expression.map(expression_arg).transpose()?,
                description: description.map(Some),
                is_paused: None,
            };
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            (
                "Transform updated successfully!",
                client.update_transform(uuid, index, req).await?,
            )
        }
        TransformCommands::Pause { pipeline, index } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let req = UpdateTransform {
                is_paused: Some(true),
                ..Default::default()
            };
            (
                "Transform paused.",
                client.update_transform(uuid, index, req).await?,
            )
        }
        TransformCommands::Resume { pipeline, index } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let req = UpdateTransform {
                is_paused: Some(false),
                ..Default::default()
            };
            (
                "Transform resumed.",
                client.update_transform(uuid, index, req).await?,
            )
        }
        TransformCommands::Replace { pipeline, file } => {
            let transforms: Vec<Transform> = read_json_file(&file)?;
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            (
                "Transforms replaced successfully!",
                client.replace_transforms(uuid, &transforms).await?,
            )
        }
    };

    print_committed(message, &pipeline);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_expression_kept() {
        assert_eq!(expression_arg("$.total".to_string()).unwrap(), "$.total");
    }

    #[test]
    fn test_missing_expression_file_errors() {
        assert!(expression_arg("@/nonexistent/expr.jsonata".to_string()).is_err());
    }
}
