//! Step domain types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a single step invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failed,
}

/// Result of one step within a run
///
/// Built once when the step concludes and never mutated afterwards.
/// `error_message` is present exactly when the status is `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub status: StepStatus,
    pub duration_seconds: f64,
    pub records_processed: u64,
    pub error_message: Option<String>,
    pub retry_attempts: u32,
}

impl StepResult {
    /// A step that produced `records` after `retry_attempts` retries
    pub fn success(elapsed: Duration, records: u64, retry_attempts: u32) -> Self {
        Self {
            status: StepStatus::Success,
            duration_seconds: round_seconds(elapsed),
            records_processed: records,
            error_message: None,
            retry_attempts,
        }
    }

    /// A step that failed for good
    pub fn failed(elapsed: Duration, retry_attempts: u32, message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            duration_seconds: round_seconds(elapsed),
            records_processed: 0,
            error_message: Some(message.into()),
            retry_attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Converts a duration to seconds rounded to two decimals
pub fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error_message() {
        let result = StepResult::success(Duration::from_millis(1234), 1000, 0);
        assert!(result.is_success());
        assert_eq!(result.records_processed, 1000);
        assert_eq!(result.duration_seconds, 1.23);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_failed_carries_message_and_retries() {
        let result = StepResult::failed(Duration::from_secs(7), 3, "database timeout");
        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.retry_attempts, 3);
        assert_eq!(result.records_processed, 0);
        assert_eq!(result.error_message.as_deref(), Some("database timeout"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&StepStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }
}
