//! Run report repository
//!
//! Persists the report of the latest run. There is exactly one report
//! location; every run overwrites it.

use shopflow_core::dto::report::RunReport;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while reading or writing a run report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage for the latest run report
pub trait ReportRepository: Send + Sync {
    /// Writes the report, replacing any previous one
    fn save(&self, report: &RunReport) -> Result<(), ReportError>;

    /// Reads the latest report, `None` if no run has been reported yet
    fn load(&self) -> Result<Option<RunReport>, ReportError>;
}

/// Report repository writing pretty JSON to a fixed path
pub struct FileReportRepository {
    path: PathBuf,
}

impl FileReportRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> ReportError {
        ReportError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ReportRepository for FileReportRepository {
    fn save(&self, report: &RunReport) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json).map_err(|e| self.io_err(e))?;

        info!("Report location: {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<RunReport>, ReportError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopflow_core::domain::run::{PipelineRun, RunStatus};
    use shopflow_core::domain::step::StepResult;
    use std::time::Duration;

    fn report(id: &str, status: RunStatus) -> RunReport {
        let mut run = PipelineRun::start_at(id, Utc::now());
        run.record_step(
            "data_generation",
            StepResult::success(Duration::from_secs(1), 1000, 0),
        );
        run.complete(status, Utc::now());
        RunReport::from(&run)
    }

    #[test]
    fn test_load_missing_report_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileReportRepository::new(dir.path().join("report.json"));
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_directories_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileReportRepository::new(
            dir.path()
                .join("data")
                .join("processed")
                .join("pipeline_execution_report.json"),
        );

        let saved = report("PIPE_1", RunStatus::Success);
        repo.save(&saved).unwrap();

        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_save_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileReportRepository::new(dir.path().join("report.json"));

        repo.save(&report("PIPE_1", RunStatus::Success)).unwrap();
        repo.save(&report("PIPE_2", RunStatus::Failed)).unwrap();

        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded.pipeline_execution_id, "PIPE_2");
        assert_eq!(loaded.status, RunStatus::Failed);
    }

    #[test]
    fn test_corrupt_report_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, "{ not json").unwrap();

        let repo = FileReportRepository::new(path);
        assert!(matches!(repo.load(), Err(ReportError::Serialization(_))));
    }
}
