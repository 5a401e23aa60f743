//! Service layer
//!
//! Services hold the pipeline's control logic: running steps with retries,
//! sequencing them into a run, launching runs under the lock, and the
//! post-run cleanup.
//!
//! Collaborators sit behind traits so they can be swapped in tests.

pub mod cleanup;
pub mod executor;
pub mod launcher;
pub mod orchestrator;
pub mod trigger;

pub use cleanup::{CleanupError, CleanupJob, CleanupSummary, RetentionCleanup};
pub use executor::{ERROR_CHANNEL, RetryPolicy, StepExecutor, StepFailure};
pub use launcher::{InProcessLauncher, PipelineLauncher, ProcessLauncher};
pub use orchestrator::{Orchestrator, ReportWriteError};
pub use trigger::{TriggerOutcome, trigger_pipeline};
