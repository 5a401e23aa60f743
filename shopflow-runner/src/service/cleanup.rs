//! Retention cleanup
//!
//! Runs after a successful pipeline execution and deletes old files from the
//! raw, staging and log directories. A file survives if its name contains a
//! preserve keyword or if it was modified today.

use chrono::{DateTime, Local, TimeDelta};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while scanning or deleting files
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a cleanup pass removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub removed: Vec<PathBuf>,
}

impl CleanupSummary {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Post-run housekeeping job
pub trait CleanupJob: Send + Sync {
    fn run(&self) -> Result<CleanupSummary, CleanupError>;
}

/// Deletes files older than the retention window
pub struct RetentionCleanup {
    target_dirs: Vec<PathBuf>,
    retention_days: u32,
    preserve_keywords: Vec<String>,
}

impl RetentionCleanup {
    pub fn new(target_dirs: Vec<PathBuf>, retention_days: u32, preserve_keywords: Vec<String>) -> Self {
        Self {
            target_dirs,
            retention_days,
            preserve_keywords: preserve_keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    /// Runs a pass as if the current time were `now`
    pub fn run_at(&self, now: DateTime<Local>) -> Result<CleanupSummary, CleanupError> {
        let cutoff = now - TimeDelta::days(i64::from(self.retention_days));
        let mut summary = CleanupSummary::default();

        for dir in &self.target_dirs {
            if !dir.is_dir() {
                debug!("Skipping missing directory {}", dir.display());
                continue;
            }

            let scan_err = |source| CleanupError::Scan {
                path: dir.clone(),
                source,
            };

            for entry in fs::read_dir(dir).map_err(scan_err)? {
                let entry = entry.map_err(scan_err)?;
                let metadata = entry.metadata().map_err(scan_err)?;
                if !metadata.is_file() {
                    continue;
                }

                let modified: DateTime<Local> = metadata
                    .modified()
                    .unwrap_or(SystemTime::now())
                    .into();
                if modified >= cutoff {
                    continue;
                }

                let path = entry.path();
                if self.should_preserve(&entry.file_name().to_string_lossy(), modified, now) {
                    debug!("Preserving {}", path.display());
                    continue;
                }

                fs::remove_file(&path).map_err(|source| CleanupError::Delete {
                    path: path.clone(),
                    source,
                })?;
                info!("Deleted old file: {}", path.display());
                summary.removed.push(path);
            }
        }

        info!("Cleanup completed. Files removed: {}", summary.removed_count());
        Ok(summary)
    }

    fn should_preserve(&self, file_name: &str, modified: DateTime<Local>, now: DateTime<Local>) -> bool {
        let name = file_name.to_lowercase();
        if self.preserve_keywords.iter().any(|k| name.contains(k.as_str())) {
            return true;
        }
        modified.date_naive() == now.date_naive()
    }
}

impl CleanupJob for RetentionCleanup {
    fn run(&self) -> Result<CleanupSummary, CleanupError> {
        self.run_at(Local::now())
    }
}
