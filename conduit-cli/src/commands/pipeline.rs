//! Pipeline command handlers
//!
//! Handles pipeline creation, listing, inspection and whole-graph updates.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use conduit_client::ControlClient;
use conduit_core::domain::pipeline::{
    PipelineStatus, SinkConnector, SourceConnector, Stream, Transform,
};
use conduit_core::dto::pipeline::{CreatePipeline, EnrichedPipeline, UpdatePipeline};
use serde::Deserialize;

use crate::commands::{print_committed, read_json_file};
use crate::config::Config;
use crate::id_resolver::{resolve_pipeline_id, resolve_workspace_id};
use crate::types::IdOrPrefix;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create a new pipeline
    Create {
        /// Owning workspace ID, code, or ID prefix
        #[arg(short, long)]
        workspace: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// JSON file with initial streams, connectors and transforms
        #[arg(short, long)]
        graph: Option<String>,
    },
    /// List all pipelines
    List,
    /// Show a pipeline with resolved names and wire names
    Get {
        /// Pipeline ID, code, or unambiguous ID prefix
        id: String,

        /// Environment used for wire names (server default if omitted)
        #[arg(short, long)]
        environment: Option<String>,
    },
    /// Update pipeline fields; graph lists in the file replace whole lists
    Update {
        /// Pipeline ID, code, or unambiguous ID prefix
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// draft, active, paused or failed
        #[arg(short, long)]
        status: Option<PipelineStatus>,

        /// JSON file with streams / sourceConnectors / sinkConnectors / transforms
        #[arg(short, long)]
        graph: Option<String>,
    },
}

/// Graph file layout; every list is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphFile {
    streams: Option<Vec<Stream>>,
    source_connectors: Option<Vec<SourceConnector>>,
    sink_connectors: Option<Vec<SinkConnector>>,
    transforms: Option<Vec<Transform>>,
}

pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = ControlClient::new(&config.control_url);

    match command {
        PipelineCommands::Create {
            workspace,
            name,
            description,
            graph,
        } => create_pipeline(&client, &workspace, name, description, graph).await,
        PipelineCommands::List => list_pipelines(&client).await,
        PipelineCommands::Get { id, environment } => {
            get_pipeline(&client, &id, environment.as_deref()).await
        }
        PipelineCommands::Update {
            id,
            name,
            description,
            status,
            graph,
        } => {
            let graph: GraphFile = match graph {
                Some(path) => read_json_file(&path)?,
                None => GraphFile::default(),
            };
            let req = UpdatePipeline {
                name,
                description,
                status,
                streams: graph.streams,
                source_connectors: graph.source_connectors,
                sink_connectors: graph.sink_connectors,
                transforms: graph.transforms,
                ..Default::default()
            };

            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&id)).await?;
            let pipeline = client.update_pipeline(uuid, req).await?;
            print_committed("Pipeline updated successfully!", &pipeline);
            Ok(())
        }
    }
}

async fn create_pipeline(
    client: &ControlClient,
    workspace: &str,
    name: String,
    description: Option<String>,
    graph: Option<String>,
) -> Result<()> {
    let workspace_id = resolve_workspace_id(client, &IdOrPrefix::parse(workspace)).await?;

    let graph: GraphFile = match graph {
        Some(path) => read_json_file(&path)?,
        None => GraphFile::default(),
    };

    let pipeline = client
        .create_pipeline(CreatePipeline {
            workspace_id,
            name,
            description,
            streams: graph.streams.unwrap_or_default(),
            source_connectors: graph.source_connectors.unwrap_or_default(),
            sink_connectors: graph.sink_connectors.unwrap_or_default(),
            transforms: graph.transforms.unwrap_or_default(),
        })
        .await?;

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  ID:     {}", pipeline.id.to_string().cyan());
    println!("  Code:   {}", pipeline.code.bold());
    println!("  Name:   {}", pipeline.name);
    println!("  Status: {}", pipeline.status.to_string().yellow());

    Ok(())
}

async fn list_pipelines(client: &ControlClient) -> Result<()> {
    let pipelines = client.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} pipeline(s):", pipelines.len()).bold()
    );
    println!();
    for pipeline in pipelines {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            pipeline.code.bold(),
            pipeline.name
        );
        println!("    ID:      {}", pipeline.id.to_string().dimmed());
        println!("    Status:  {}", pipeline.status);
        println!(
            "    Graph:   {} streams, {} transforms",
            pipeline.stream_count, pipeline.transform_count
        );
        println!(
            "    Updated: {}",
            pipeline
                .updated_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
        println!();
    }

    Ok(())
}

async fn get_pipeline(client: &ControlClient, id: &str, environment: Option<&str>) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;
    let pipeline = client.get_pipeline(uuid, environment).await?;

    print_pipeline_details(&pipeline);

    Ok(())
}

fn topic_or_dash(topic: &Option<String>) -> String {
    topic.clone().unwrap_or_else(|| "-".to_string())
}

/// Print detailed pipeline information
fn print_pipeline_details(pipeline: &EnrichedPipeline) {
    println!("{}", "Pipeline Details:".bold());
    println!("  ID:          {}", pipeline.id.to_string().cyan());
    println!("  Code:        {}", pipeline.code.bold());
    println!("  Name:        {}", pipeline.name.bold());
    if !pipeline.description.is_empty() {
        println!("  Description: {}", pipeline.description);
    }
    println!("  Status:      {}", pipeline.status);
    println!(
        "  Workspace:   {}",
        pipeline
            .workspace_code
            .clone()
            .unwrap_or_else(|| format!("{} (missing)", pipeline.workspace_id))
    );
    println!("  Environment: {}", pipeline.environment);
    println!("  Revision:    {}", pipeline.revision);
    println!(
        "  Updated:     {}",
        pipeline.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    println!("\n{}", "Streams:".bold());
    for s in &pipeline.streams {
        println!(
            "  {} {:<8} {}",
            s.stream.stream_name.cyan(),
            s.stream.variant.to_string(),
            topic_or_dash(&s.topic).dimmed()
        );
    }

    println!("\n{}", "Source connectors:".bold());
    for (i, c) in pipeline.source_connectors.iter().enumerate() {
        println!(
            "  [{}] {} ({}) -> {}",
            i,
            c.client_name.bold(),
            c.connector.connector_type,
            topic_or_dash(&c.topic).dimmed()
        );
    }

    println!("\n{}", "Sink connectors:".bold());
    for (i, c) in pipeline.sink_connectors.iter().enumerate() {
        println!(
            "  [{}] {} -> {} ({})",
            i,
            topic_or_dash(&c.topic).dimmed(),
            c.connection_name.bold(),
            c.connector.connector_type
        );
    }

    println!("\n{}", "Transforms:".bold());
    for (i, t) in pipeline.transforms.iter().enumerate() {
        let paused = if t.transform.is_paused { " (paused)".yellow() } else { "".normal() };
        println!(
            "  [{}] {} -> {}{}",
            i,
            t.transform.source_stream.cyan(),
            t.transform.target_stream.cyan(),
            paused
        );
        if let Some(queue) = &t.transform.failure_queue {
            println!("      failures -> {}", queue.red());
        }
        println!("      {}", t.transform.expression.dimmed());
    }
}
