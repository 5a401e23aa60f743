//! Step executor
//!
//! Invokes one step, measures it, and applies the retry policy:
//! - transient failures are retried with exponential backoff, up to
//!   `max_retries` times, and the last one becomes the step's failure
//! - fatal failures are reported on the error channel with their full
//!   context chain and returned at once
//!
//! Each attempt runs on its own task so a panicking step turns into a fatal
//! failure instead of taking down the caller.

use shopflow_core::domain::step::StepResult;
use shopflow_core::error::StepError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::step::PipelineStep;

/// Log target of the dedicated error channel
pub const ERROR_CHANNEL: &str = "pipeline_errors";

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (1-indexed): `base * 2^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// A step that did not succeed
///
/// Carries the failed result so the caller can record it before stopping.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct StepFailure {
    pub result: StepResult,
    #[source]
    pub error: StepError,
}

/// Runs steps under a retry policy
#[derive(Debug, Clone, Default)]
pub struct StepExecutor {
    policy: RetryPolicy,
}

impl StepExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes a step until it succeeds, fails fatally, or runs out of retries
    pub async fn execute(&self, step: Arc<dyn PipelineStep>) -> Result<StepResult, StepFailure> {
        let name = step.name().to_string();
        let max_retries = self.policy.max_retries;
        let started = Instant::now();
        let mut retries = 0u32;

        loop {
            info!(step = %name, attempt = retries + 1, "START step: {}", name);

            let error = match Self::attempt(Arc::clone(&step)).await {
                Ok(records) => {
                    let result = StepResult::success(started.elapsed(), records, retries);
                    info!(
                        step = %name,
                        records,
                        duration_seconds = result.duration_seconds,
                        retries,
                        "SUCCESS step: {} | records={} | duration={}s",
                        name,
                        records,
                        result.duration_seconds
                    );
                    return Ok(result);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                error!(step = %name, "FAILED step: {}: {}", name, error);
                error!(target: ERROR_CHANNEL, "FAILED step: {}\n{:?}", name, error.inner());
                return Err(Self::failure(started, retries, error));
            }

            if retries >= max_retries {
                error!(
                    step = %name,
                    max_retries,
                    "Max retries exceeded for {}: {}",
                    name,
                    error
                );
                return Err(Self::failure(started, retries, error));
            }

            retries += 1;
            let delay = self.policy.delay_for(retries);
            warn!(
                step = %name,
                attempt = retries,
                max_retries,
                delay_secs = delay.as_secs_f64(),
                "Transient error in {}: {}. Retry {}/{} after {:?}",
                name,
                error,
                retries,
                max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(step: Arc<dyn PipelineStep>) -> Result<u64, StepError> {
        let name = step.name().to_string();
        match tokio::spawn(async move { step.run().await }).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => Err(StepError::fatal(format!("step '{}' panicked", name))),
            Err(e) => Err(StepError::fatal(format!("step '{}' was aborted: {}", name, e))),
        }
    }

    fn failure(started: Instant, retries: u32, error: StepError) -> StepFailure {
        StepFailure {
            result: StepResult::failed(started.elapsed(), retries, error.to_string()),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::FnStep;
    use shopflow_core::domain::step::StepStatus;
    use shopflow_core::error::FailureKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails transiently `failures` times, then returns `records`
    fn flaky(name: &str, failures: u32, records: u64) -> (Arc<dyn PipelineStep>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let step = FnStep::new(name, move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < failures {
                    Err(StepError::transient(format!("timeout #{}", call + 1)))
                } else {
                    Ok(records)
                }
            }
        });
        (Arc::new(step), calls)
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_scales_with_base_and_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
        assert_eq!(policy.delay_for(200), Duration::from_millis(10).saturating_mul(u32::MAX));
    }

    #[tokio::test]
    async fn test_first_try_success_has_no_retries() {
        let (step, calls) = flaky("data_generation", 0, 1000);
        let result = StepExecutor::default().execute(step).await.unwrap();

        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.records_processed, 1000);
        assert_eq!(result.retry_attempts, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_within_budget_succeed() {
        let (step, calls) = flaky("data_quality_checks", 2, 995);
        let result = StepExecutor::default().execute(step).await.unwrap();

        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.retry_attempts, 2);
        assert_eq!(result.records_processed, 995);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff
        assert!(result.duration_seconds >= 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_up_to_max_succeed() {
        let (step, _) = flaky("warehouse_load", 3, 995);
        let result = StepExecutor::default().execute(step).await.unwrap();
        assert_eq!(result.retry_attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_with_last_error() {
        let (step, calls) = flaky("warehouse_load", 10, 995);
        let failure = StepExecutor::default().execute(step).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(failure.error.kind(), FailureKind::Transient);
        assert_eq!(failure.result.status, StepStatus::Failed);
        assert_eq!(failure.result.retry_attempts, 3);
        assert_eq!(failure.result.error_message.as_deref(), Some("timeout #4"));
        // 1s + 2s + 4s of backoff
        assert!(failure.result.duration_seconds >= 7.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_fails_on_first_transient() {
        let (step, calls) = flaky("data_ingestion", 1, 10);
        let executor = StepExecutor::new(RetryPolicy::new(0, Duration::from_secs(1)));
        let failure = executor.execute(step).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failure.result.retry_attempts, 0);
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let step = FnStep::new("staging_to_production", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<u64, _>(StepError::fatal("duplicate key value violates unique constraint")) }
        });

        let failure = StepExecutor::default()
            .execute(Arc::new(step))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failure.error.kind(), FailureKind::Fatal);
        assert_eq!(failure.result.retry_attempts, 0);
        assert!(
            failure
                .result
                .error_message
                .unwrap()
                .contains("duplicate key")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_after_transient_keeps_retry_count() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let step = FnStep::new("warehouse_load", move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err::<u64, _>(StepError::transient("timeout"))
                } else {
                    Err(StepError::fatal("schema mismatch"))
                }
            }
        });

        let failure = StepExecutor::default()
            .execute(Arc::new(step))
            .await
            .unwrap_err();
        assert_eq!(failure.result.retry_attempts, 1);
        assert_eq!(failure.error.kind(), FailureKind::Fatal);
    }

    #[tokio::test]
    async fn test_panicking_step_becomes_fatal() {
        let step = FnStep::new("analytics_generation", || async {
            if true {
                panic!("unexpected null");
            }
            Ok::<u64, StepError>(0)
        });

        let failure = StepExecutor::default()
            .execute(Arc::new(step))
            .await
            .unwrap_err();
        assert_eq!(failure.error.kind(), FailureKind::Fatal);
        assert!(failure.to_string().contains("panicked"));
    }
}
