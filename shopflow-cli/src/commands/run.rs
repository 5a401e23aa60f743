//! Manual pipeline run

use anyhow::{Result, bail};
use chrono::Local;
use colored::*;
use shopflow_runner::bootstrap;
use shopflow_runner::config::{Config, ConfigSource};
use shopflow_runner::logging::{self, LoggingConfig};
use shopflow_runner::repository::ReportRepository;
use shopflow_runner::service::{InProcessLauncher, TriggerOutcome, trigger_pipeline};
use std::sync::Arc;
use tracing::info;

use super::report::print_report;

/// Runs the pipeline in this process
///
/// Fails (non-zero exit) when the run failed or was skipped.
pub async fn handle_run_command(config: &Config, source: &ConfigSource, no_lock: bool) -> Result<()> {
    logging::init(&LoggingConfig::single_run(&config.paths.log_dir, Local::now()))?;
    info!("Configuration: {}", source);

    let lock = bootstrap::lock(config);
    let launcher = InProcessLauncher::new(Arc::new(bootstrap::orchestrator(config)?));
    let prevent_concurrent = config.scheduler.prevent_concurrent && !no_lock;

    let outcome = trigger_pipeline(lock.as_ref(), prevent_concurrent, &launcher).await?;

    if outcome == TriggerOutcome::Skipped {
        println!(
            "{}",
            format!("Pipeline already running (lock: {})", lock.path().display()).yellow()
        );
        bail!("Run skipped");
    }

    println!();
    match bootstrap::reports(config).load()? {
        Some(report) => print_report(&report),
        None => println!("{}", "No report was written.".yellow()),
    }

    if outcome == TriggerOutcome::Failed {
        bail!("Pipeline run failed");
    }

    Ok(())
}
