//! Pipeline orchestrator
//!
//! Runs the configured steps strictly in order through the step executor and
//! stops at the first step whose failure was not absorbed by retries. Every
//! concluded step, failed or not, is recorded before deciding whether to
//! continue. The run is always completed and its report always written,
//! whatever the outcome. A report that cannot be written fails the run
//! attempt as a whole.

use chrono::Utc;
use shopflow_core::domain::run::{PipelineRun, RunStatus};
use shopflow_core::dto::report::RunReport;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::repository::{ReportError, ReportRepository};
use crate::service::executor::{ERROR_CHANNEL, StepExecutor};
use crate::step::PipelineStep;

/// The run concluded but its report was not persisted
#[derive(Debug, Error)]
#[error("failed to write report for run {}", .run.id())]
pub struct ReportWriteError {
    pub run: Box<PipelineRun>,
    #[source]
    pub source: ReportError,
}

/// Ordered step sequence with its executor and report sink
pub struct Orchestrator {
    steps: Vec<Arc<dyn PipelineStep>>,
    executor: StepExecutor,
    reports: Arc<dyn ReportRepository>,
}

impl Orchestrator {
    pub fn new(executor: StepExecutor, reports: Arc<dyn ReportRepository>) -> Self {
        Self {
            steps: Vec::new(),
            executor,
            reports,
        }
    }

    /// Appends a step to the end of the sequence
    pub fn with_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Executes one full run and persists its report
    ///
    /// The completed run is returned inside the error when the report write
    /// fails.
    pub async fn run(&self) -> Result<PipelineRun, ReportWriteError> {
        let mut run = PipelineRun::start();
        info!(
            "Starting pipeline run {} with {} step(s)",
            run.id(),
            self.steps.len()
        );

        let status = self.execute_steps(&mut run).await;
        run.complete(status, Utc::now());

        match status {
            RunStatus::Success => info!(
                "Pipeline run {} succeeded in {:.2}s ({} records)",
                run.id(),
                run.total_duration_seconds().unwrap_or_default(),
                run.total_records()
            ),
            _ => error!("Pipeline run {} failed, execution stopped", run.id()),
        }

        match self.write_report(&run) {
            Ok(()) => Ok(run),
            Err(source) => Err(ReportWriteError {
                run: Box::new(run),
                source,
            }),
        }
    }

    async fn execute_steps(&self, run: &mut PipelineRun) -> RunStatus {
        let total = self.steps.len();

        for (idx, step) in self.steps.iter().enumerate() {
            info!("Executing step {}/{}: {}", idx + 1, total, step.name());

            match self.executor.execute(Arc::clone(step)).await {
                Ok(result) => run.record_step(step.name(), result),
                Err(failure) => {
                    run.record_step(step.name(), failure.result);
                    run.record_error(failure.error.to_string());

                    let skipped = total - idx - 1;
                    if skipped > 0 {
                        info!("Skipping {} remaining step(s)", skipped);
                    }
                    return RunStatus::Failed;
                }
            }
        }

        RunStatus::Success
    }

    fn write_report(&self, run: &PipelineRun) -> Result<(), ReportError> {
        let report = RunReport::from(run);
        match self.reports.save(&report) {
            Ok(()) => {
                info!("Pipeline execution report generated for {}", run.id());
                Ok(())
            }
            Err(e) => {
                error!("Failed to write report for {}: {}", run.id(), e);
                error!(target: ERROR_CHANNEL, "REPORT WRITE FAILED: {}\n{:?}", run.id(), e);
                Err(e)
            }
        }
    }
}
