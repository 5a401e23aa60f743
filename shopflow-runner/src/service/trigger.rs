//! Guarded pipeline trigger
//!
//! The single entry point for starting a run from the scheduler or the CLI.
//! With concurrency prevention on, a held lock means the trigger is skipped
//! (never queued), and a launched run holds the lock through a scoped guard
//! until it ends, however it ends.

use anyhow::{Context, Result};
use shopflow_core::domain::run::RunStatus;
use tracing::{error, info, warn};

use crate::repository::{LockGuard, LockMarker};
use crate::service::launcher::PipelineLauncher;

/// What a trigger attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Another run holds the lock, nothing was started
    Skipped,
    Succeeded,
    Failed,
}

/// Launches one run subject to the lock
///
/// Returns an error when the lock cannot be acquired or the launcher itself
/// fails; the lock is released in both cases if it was taken.
pub async fn trigger_pipeline(
    lock: &dyn LockMarker,
    prevent_concurrent: bool,
    launcher: &dyn PipelineLauncher,
) -> Result<TriggerOutcome> {
    if prevent_concurrent && lock.is_held() {
        warn!("Pipeline already running. Skipping execution.");
        return Ok(TriggerOutcome::Skipped);
    }

    info!("Triggering pipeline execution");

    let _guard = if prevent_concurrent {
        Some(LockGuard::acquire(lock).context("Failed to acquire pipeline lock")?)
    } else {
        None
    };

    let outcome = match launcher.launch().await? {
        RunStatus::Success => {
            info!("Pipeline execution SUCCESS");
            TriggerOutcome::Succeeded
        }
        status => {
            error!("Pipeline execution FAILED (status: {})", status);
            TriggerOutcome::Failed
        }
    };

    Ok(outcome)
}
