//! Pipeline run domain types

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::step::{StepResult, round_seconds};

/// Pipeline run status
///
/// A run starts as `Running` and moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Data quality figures attached to every run report
///
/// Filled in by the quality checks downstream; a run on its own reports the
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualitySummary {
    pub quality_score: u32,
    pub critical_issues: u32,
}

impl Default for DataQualitySummary {
    fn default() -> Self {
        Self {
            quality_score: 100,
            critical_issues: 0,
        }
    }
}

/// One execution of the full step sequence
///
/// Steps and errors are append-only. `end_time` is set exactly once, by
/// [`PipelineRun::complete`], and only then does the status become terminal.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    id: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    status: RunStatus,
    steps: Vec<(String, StepResult)>,
    errors: Vec<String>,
    warnings: Vec<String>,
    data_quality: DataQualitySummary,
}

impl PipelineRun {
    /// Starts a new run now, with a timestamp-derived id
    pub fn start() -> Self {
        Self::start_at(Self::id_for(Local::now()), Utc::now())
    }

    /// Starts a run with an explicit id and start time
    pub fn start_at(id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time: None,
            status: RunStatus::Running,
            steps: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            data_quality: DataQualitySummary::default(),
        }
    }

    /// Builds the run id for a local start time, e.g. `PIPE_20260101_020000`
    pub fn id_for(started: DateTime<Local>) -> String {
        format!("PIPE_{}", started.format("%Y%m%d_%H%M%S"))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Step results in execution order
    pub fn steps(&self) -> &[(String, StepResult)] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps
            .iter()
            .find(|(step, _)| step == name)
            .map(|(_, result)| result)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn data_quality(&self) -> &DataQualitySummary {
        &self.data_quality
    }

    pub fn set_data_quality(&mut self, summary: DataQualitySummary) {
        self.data_quality = summary;
    }

    /// Appends the result of a concluded step
    ///
    /// Ignored once the run is complete.
    pub fn record_step(&mut self, name: impl Into<String>, result: StepResult) {
        if self.status.is_terminal() {
            return;
        }
        self.steps.push((name.into(), result));
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.errors.push(message.into());
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.warnings.push(message.into());
    }

    /// Moves the run to a terminal status and stamps the end time
    ///
    /// Returns `false` and leaves the run untouched when it is already
    /// complete or when `status` is not terminal.
    pub fn complete(&mut self, status: RunStatus, end_time: DateTime<Utc>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.end_time = Some(end_time);
        true
    }

    /// Wall-clock seconds between start and end, once complete
    pub fn total_duration_seconds(&self) -> Option<f64> {
        self.end_time.map(|end| {
            let elapsed = (end - self.start_time).to_std().unwrap_or_default();
            round_seconds(elapsed)
        })
    }

    /// Total records reported by successful steps
    pub fn total_records(&self) -> u64 {
        self.steps
            .iter()
            .filter(|(_, result)| result.is_success())
            .map(|(_, result)| result.records_processed)
            .sum()
    }
}
