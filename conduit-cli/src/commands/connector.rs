//! Connector command handlers
//!
//! Source connectors bind a client to a source stream; sink connectors bind
//! a connection to a sink stream.

use anyhow::Result;
use clap::Subcommand;
use conduit_client::ControlClient;
use conduit_core::domain::pipeline::{ConnectorType, SinkConnector, SourceConnector};
use conduit_core::dto::pipeline::{UpdateSinkConnector, UpdateSourceConnector};

use crate::commands::{print_committed, read_json_file};
use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::types::IdOrPrefix;

/// Connector subcommands
#[derive(Subcommand)]
pub enum ConnectorCommands {
    /// Attach a client to a source stream
    AddSource {
        /// Pipeline ID, code, or unambiguous ID prefix
        pipeline: String,

        #[arg(long)]
        client: String,

        /// HTTP or S3
        #[arg(short = 't', long = "type")]
        connector_type: ConnectorType,

        #[arg(short, long)]
        stream: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change the source connector at a position
    UpdateSource {
        pipeline: String,

        index: usize,

        #[arg(long)]
        client: Option<String>,

        #[arg(short = 't', long = "type")]
        connector_type: Option<ConnectorType>,

        #[arg(short, long)]
        stream: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Replace all source connectors with the JSON array in a file
    ReplaceSources {
        pipeline: String,

        #[arg(short, long)]
        file: String,
    },
    /// Attach a connection to a sink stream
    AddSink {
        /// Pipeline ID, code, or unambiguous ID prefix
        pipeline: String,

        #[arg(long)]
        connection: String,

        /// HTTP or S3
        #[arg(short = 't', long = "type")]
        connector_type: ConnectorType,

        #[arg(short, long)]
        stream: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change the sink connector at a position
    UpdateSink {
        pipeline: String,

        index: usize,

        #[arg(long)]
        connection: Option<String>,

        #[arg(short = 't', long = "type")]
        connector_type: Option<ConnectorType>,

        #[arg(short, long)]
        stream: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Replace all sink connectors with the JSON array in a file
    ReplaceSinks {
        pipeline: String,

        #[arg(short, long)]
        file: String,
    },
}

pub async fn handle_connector_command(command: ConnectorCommands, config: &Config) -> Result<()> {
    let client = ControlClient::new(&config.control_url);

    let (message, pipeline) = match command {
        ConnectorCommands::AddSource {
            pipeline,
            client: client_id,
            connector_type,
            stream,
            description,
        } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let connector = SourceConnector {
                client_id,
                connector_type,
                stream_name: stream,
                description,
            };
            (
                "Source connector added successfully!",
                client.add_source_connector(uuid, connector).await?,
            )
        }
        ConnectorCommands::UpdateSource {
            pipeline,
            index,
            client: client_id,
            connector_type,
            stream,
            description,
        } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let req = UpdateSourceConnector {
                client_id,
                connector_type,
                stream_name: stream,
                description: description.map(Some),
            };
            (
                "Source connector updated successfully!",
                client.update_source_connector(uuid, index, req).await?,
            )
        }
        ConnectorCommands::ReplaceSources { pipeline, file } => {
            let connectors: Vec<SourceConnector> = read_json_file(&file)?;
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            (
                "Source connectors replaced successfully!",
                client.replace_source_connectors(uuid, &connectors).await?,
            )
        }
        ConnectorCommands::AddSink {
            pipeline,
            connection,
            connector_type,
            stream,
            description,
        } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let connector = SinkConnector {
                connection_id: connection,
                connector_type,
                stream_name: stream,
                description,
            };
            (
                "Sink connector added successfully!",
                client.add_sink_connector(uuid, connector).await?,
            )
        }
        ConnectorCommands::UpdateSink {
            pipeline,
            index,
            connection,
            connector_type,
            stream,
            description,
        } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let req = UpdateSinkConnector {
                connection_id: connection,
                connector_type,
                stream_name: stream,
                description: description.map(Some),
            };
            (
                "Sink connector updated successfully!",
                client.update_sink_connector(uuid, index, req).await?,
            )
        }
        ConnectorCommands::ReplaceSinks { pipeline, file } => {
            let connectors: Vec<SinkConnector> = read_json_file(&file)?;
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            (
                "Sink connectors replaced successfully!",
                client.replace_sink_connectors(uuid, &connectors).await?,
            )
        }
    };

    print_committed(message, &pipeline);
    Ok(())
}
