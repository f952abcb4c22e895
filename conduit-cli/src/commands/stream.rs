//! Stream command handlers

use anyhow::Result;
use clap::Subcommand;
use conduit_client::ControlClient;
use conduit_core::domain::pipeline::{Stream, StreamVariant};
use conduit_core::dto::pipeline::UpdateStream;

use crate::commands::print_committed;
use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::types::IdOrPrefix;

/// Stream subcommands
#[derive(Subcommand)]
pub enum StreamCommands {
    /// Add a stream to a pipeline (the name is normalized)
    Add {
        /// Pipeline ID, code, or unambiguous ID prefix
        pipeline: String,

        /// Stream name, e.g. orders.raw
        name: String,

        /// source, sink, dlq or replay
        variant: StreamVariant,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Update the stream identified by name and variant
    Update {
        /// Pipeline ID, code, or unambiguous ID prefix
        pipeline: String,

        name: String,

        variant: StreamVariant,

        /// New stream name
        #[arg(long)]
        rename: Option<String>,

        /// New variant
        #[arg(long)]
        set_variant: Option<StreamVariant>,

        #[arg(short, long)]
        description: Option<String>,

        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
    },
}

pub async fn handle_stream_command(command: StreamCommands, config: &Config) -> Result<()> {
    let client = ControlClient::new(&config.control_url);

    match command {
        StreamCommands::Add {
            pipeline,
            name,
            variant,
            description,
        } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let stream = Stream {
                stream_name: name,
                variant,
                description,
            };
            let pipeline = client.add_stream(uuid, stream).await?;
            print_committed("Stream added successfully!", &pipeline);
            Ok(())
        }
        StreamCommands::Update {
            pipeline,
            name,
            variant,
            rename,
            set_variant,
            description,
            clear_description,
        } => {
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline)).await?;
            let req = UpdateStream {
                stream_name: rename,
                variant: set_variant,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
            };
            let pipeline = client.update_stream(uuid, &name, variant, req).await?;
            print_committed("Stream updated successfully!", &pipeline);
            Ok(())
        }
    }
}
