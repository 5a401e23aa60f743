//! Lock marker inspection

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use shopflow_runner::bootstrap;
use shopflow_runner::config::Config;
use shopflow_runner::repository::LockMarker;

/// Lock subcommands
#[derive(Subcommand)]
pub enum LockCommands {
    /// Show whether the lock is held and by which pid
    Status,
    /// Remove a stale lock left by a crashed run
    Clear,
}

pub fn handle_lock_command(command: LockCommands, config: &Config) -> Result<()> {
    let lock = bootstrap::lock(config);

    match command {
        LockCommands::Status => {
            if lock.is_held() {
                let owner = lock.owner().unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{} {} (pid {})",
                    "Held:".yellow().bold(),
                    lock.path().display(),
                    owner
                );
            } else {
                println!("{} {}", "Free:".green().bold(), lock.path().display());
            }
        }
        LockCommands::Clear => {
            if !lock.is_held() {
                println!("{}", "Lock is not held.".dimmed());
                return Ok(());
            }
            lock.release()?;
            println!("{} {}", "✓ Removed".green(), lock.path().display());
        }
    }

    Ok(())
}
