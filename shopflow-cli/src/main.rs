//! Shopflow CLI
//!
//! Operator commands for the warehouse pipeline: manual runs, the last
//! report, the lock marker and retention cleanup.

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use shopflow_runner::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shopflow")]
#[command(about = "Shopflow warehouse pipeline CLI", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "SHOPFLOW_CONFIG", default_value = "config/config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, source) = Config::load(&cli.config)?;

    handle_command(cli.command, &config, &source).await
}
