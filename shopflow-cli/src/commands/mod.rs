//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod cleanup;
mod lock;
mod report;
mod run;

pub use lock::LockCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use shopflow_core::domain::run::RunStatus;
use shopflow_runner::config::{Config, ConfigSource};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline once, now
    Run {
        /// Do not take the lock (when launched by the scheduler, which holds it)
        #[arg(long)]
        no_lock: bool,
    },
    /// Show the last run report
    Report,
    /// Inspect or clear the pipeline lock
    Lock {
        #[command(subcommand)]
        command: LockCommands,
    },
    /// Delete files past the retention window
    Cleanup,
}

/// Routes the command to its handler module
pub async fn handle_command(
    command: Commands,
    config: &Config,
    source: &ConfigSource,
) -> Result<()> {
    match command {
        Commands::Run { no_lock } => run::handle_run_command(config, source, no_lock).await,
        Commands::Report => report::handle_report_command(config),
        Commands::Lock { command } => lock::handle_lock_command(command, config),
        Commands::Cleanup => cleanup::handle_cleanup_command(config),
    }
}

/// Colorize run status for display
pub(crate) fn colorize_status(status: RunStatus) -> ColoredString {
    let status_str = status.to_string().to_uppercase();
    match status {
        RunStatus::Running => status_str.cyan(),
        RunStatus::Success => status_str.green(),
        RunStatus::Failed => status_str.red(),
    }
}
