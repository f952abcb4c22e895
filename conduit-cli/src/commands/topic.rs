//! Topic command handlers
//!
//! Encoding and decoding run locally unless `--remote` asks the control
//! plane to decode.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use conduit_client::ControlClient;
use conduit_core::domain::pipeline::StreamVariant;
use conduit_core::topic::{self, TopicName};

use crate::config::Config;

/// Topic subcommands
#[derive(Subcommand)]
pub enum TopicCommands {
    /// Build a wire name from its components
    Encode {
        #[arg(short, long, default_value = "dev")]
        environment: String,

        /// Workspace code
        #[arg(short, long)]
        workspace: String,

        /// Pipeline code
        #[arg(short, long)]
        pipeline: String,

        #[arg(short, long)]
        stream: String,

        #[arg(short, long)]
        variant: StreamVariant,
    },
    /// Split a wire name into its components
    Decode {
        wire_name: String,

        /// Decode through the control plane instead of locally
        #[arg(long)]
        remote: bool,
    },
}

pub async fn handle_topic_command(command: TopicCommands, config: &Config) -> Result<()> {
    match command {
        TopicCommands::Encode {
            environment,
            workspace,
            pipeline,
            stream,
            variant,
        } => {
            if !topic::is_valid_environment(&environment) {
                bail!("Invalid environment '{}'", environment);
            }
            if !topic::is_valid_stream_name(&stream) {
                bail!(
                    "Invalid stream name '{}' (try '{}')",
                    stream,
                    topic::normalize_stream_name(&stream)
                );
            }
            println!(
                "{}",
                topic::encode(&environment, &workspace, &pipeline, &stream, variant)
            );
            Ok(())
        }
        TopicCommands::Decode { wire_name, remote } => {
            let decoded = if remote {
                ControlClient::new(&config.control_url)
                    .decode_topic(&wire_name)
                    .await?
            } else {
                topic::decode(&wire_name)?
            };
            print_topic(&decoded);
            Ok(())
        }
    }
}

fn print_topic(topic: &TopicName) {
    println!("  Environment: {}", topic.environment.cyan());
    println!("  Workspace:   {}", topic.workspace_code.bold());
    println!("  Pipeline:    {}", topic.pipeline_code.bold());
    println!("  Stream:      {}", topic.stream_name.cyan());
    println!("  Variant:     {}", topic.variant);
}
