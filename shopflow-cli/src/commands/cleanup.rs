//! Retention cleanup on demand

use anyhow::Result;
use colored::*;
use shopflow_runner::bootstrap;
use shopflow_runner::config::Config;
use shopflow_runner::service::CleanupJob;

pub fn handle_cleanup_command(config: &Config) -> Result<()> {
    let summary = bootstrap::cleanup(config).run()?;

    if summary.removed.is_empty() {
        println!("{}", "Nothing to remove.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Removed {} file(s):", summary.removed_count()).bold()
    );
    for path in &summary.removed {
        println!("  {} {}", "▸".cyan(), path.display().to_string().dimmed());
    }

    Ok(())
}
