//! Shopflow scheduler daemon
//!
//! Polls until Ctrl+C and triggers the pipeline once a day.

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

use shopflow_runner::bootstrap;
use shopflow_runner::config::Config;
use shopflow_runner::logging::{self, LoggingConfig};

const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("SHOPFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let (config, source) = Config::load(&config_path)?;
    logging::init(&LoggingConfig::scheduler(&config.paths.log_dir))?;

    info!("Starting Shopflow scheduler");
    info!("Configuration: {}", source);
    info!(
        "Loaded configuration: run_time={}, prevent_concurrent={}, steps={}",
        config.scheduler.run_time,
        config.scheduler.prevent_concurrent,
        config.steps.len()
    );

    let scheduler = bootstrap::scheduler(&config, Local::now().naive_local())?;

    scheduler
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await;

    info!("Shopflow scheduler shut down");
    Ok(())
}
