//! Log sinks
//!
//! Three layers on one registry:
//! - stdout, filtered by `RUST_LOG` (or the default filter)
//! - an activity log file, INFO and above
//! - the error channel file, only events on the [`ERROR_CHANNEL`] target

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::service::ERROR_CHANNEL;

pub const ERROR_LOG_FILE: &str = "pipeline_errors.log";
pub const SCHEDULER_LOG_FILE: &str = "scheduler_activity.log";

const DEFAULT_FILTER: &str = "shopflow_runner=info,shopflow=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub activity_file_name: String,
    pub default_filter: String,
}

impl LoggingConfig {
    /// Long-running scheduler: one activity log, appended across restarts
    pub fn scheduler(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            activity_file_name: SCHEDULER_LOG_FILE.to_string(),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    /// One-off run: an activity log per invocation
    pub fn single_run(log_dir: impl Into<PathBuf>, started: DateTime<Local>) -> Self {
        Self {
            log_dir: log_dir.into(),
            activity_file_name: format!(
                "pipeline_orchestrator_{}.log",
                started.format("%Y%m%d_%H%M%S")
            ),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    pub fn activity_path(&self) -> PathBuf {
        self.log_dir.join(&self.activity_file_name)
    }

    pub fn error_path(&self) -> PathBuf {
        self.log_dir.join(ERROR_LOG_FILE)
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Installs the global subscriber
///
/// Fails if the log directory cannot be created or a subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory {}", config.log_dir.display()))?;

    let activity = Arc::new(open_append(&config.activity_path())?);
    let errors = Arc::new(open_append(&config.error_path())?);

    let stdout_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.default_filter.as_str().into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(stdout_filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(activity)
                .with_filter(LevelFilter::INFO),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(errors)
                .with_filter(Targets::new().with_target(ERROR_CHANNEL, Level::ERROR)),
        )
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
