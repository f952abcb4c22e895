//! Conduit CLI
//!
//! Command-line interface for editing pipeline topologies through the
//! Conduit control plane.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use conduit_client::ClientError;
use config::Config;

#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "Conduit pipeline topology CLI", long_about = None)]
struct Cli {
    /// Control plane URL
    #[arg(
        long,
        env = "CONDUIT_CONTROL_URL",
        default_value = "http://localhost:8080"
    )]
    control_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        control_url: cli.control_url,
    };

    let result = handle_command(cli.command, &config).await;

    if let Err(err) = &result {
        if let Some(ClientError::Validation { violations, .. }) = err.downcast_ref::<ClientError>() {
            eprintln!("{}", "✗ Change rejected:".red().bold());
            for violation in violations {
                eprintln!(
                    "  {} {} = {:?}",
                    "▸".red(),
                    violation.field.bold(),
                    violation.value
                );
                eprintln!("    {}", violation.message.dimmed());
            }
        }
    }

    result
}
