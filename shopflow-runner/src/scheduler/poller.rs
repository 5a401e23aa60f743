//! Scheduler loop
//!
//! Polls on a fixed interval and triggers one pipeline execution per daily
//! occurrence. Runs happen inline on the loop, so there is never more than
//! one in flight from this process. Nothing that goes wrong in a trigger or
//! in cleanup stops the loop; only the shutdown signal does.

use chrono::{Local, NaiveDateTime};
use shopflow_core::domain::schedule::ScheduleConfig;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::repository::LockMarker;
use crate::scheduler::daily::DailySchedule;
use crate::service::{CleanupJob, PipelineLauncher, TriggerOutcome, trigger_pipeline};

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not yet time to run
    Idle,
    /// A trigger was attempted
    Triggered(TriggerOutcome),
    /// The trigger could not start (lock or launch failure)
    Errored,
}

/// Daily pipeline scheduler
pub struct PipelineScheduler {
    config: ScheduleConfig,
    poll_interval: Duration,
    schedule: DailySchedule,
    lock: Arc<dyn LockMarker>,
    launcher: Arc<dyn PipelineLauncher>,
    cleanup: Arc<dyn CleanupJob>,
}

impl PipelineScheduler {
    /// Creates a scheduler whose first occurrence is computed from `now`
    pub fn new(
        config: ScheduleConfig,
        poll_interval: Duration,
        lock: Arc<dyn LockMarker>,
        launcher: Arc<dyn PipelineLauncher>,
        cleanup: Arc<dyn CleanupJob>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            config,
            poll_interval,
            schedule: DailySchedule::new(config.run_time, now),
            lock,
            launcher,
            cleanup,
        }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.schedule.next_run()
    }

    /// Polls until `shutdown` completes
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Scheduler started. Pipeline scheduled daily at {} (next run: {})",
            self.config.run_time.format("%H:%M"),
            self.schedule.next_run()
        );

        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.tick(Local::now().naive_local()).await;
                }
            }
        }
    }

    /// Runs one poll as of `now`
    pub async fn tick(&mut self, now: NaiveDateTime) -> Tick {
        if !self.schedule.is_due(now) {
            debug!("Next run at {}", self.schedule.next_run());
            return Tick::Idle;
        }

        info!("Scheduler triggered pipeline execution");
        let tick = match trigger_pipeline(
            self.lock.as_ref(),
            self.config.prevent_concurrent,
            self.launcher.as_ref(),
        )
        .await
        {
            Ok(outcome) => {
                if outcome == TriggerOutcome::Succeeded {
                    self.run_cleanup();
                }
                Tick::Triggered(outcome)
            }
            Err(e) => {
                error!("Scheduler failure: {:#}", e);
                Tick::Errored
            }
        };

        self.schedule.advance(now);
        info!("Next run scheduled at {}", self.schedule.next_run());
        tick
    }

    fn run_cleanup(&self) {
        match self.cleanup.run() {
            Ok(summary) => info!("Cleanup removed {} file(s)", summary.removed_count()),
            Err(e) => warn!("Cleanup failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{FileLock, FileReportRepository, ReportError, ReportRepository};
    use crate::service::{
        CleanupError, CleanupSummary, InProcessLauncher, Orchestrator, StepExecutor,
    };
    use crate::step::{DEFAULT_STEPS, FnStep};
    use chrono::{NaiveDate, NaiveTime};
    use shopflow_core::domain::run::RunStatus;
    use shopflow_core::dto::report::RunReport;
    use shopflow_core::error::StepError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingCleanup {
        calls: AtomicU32,
        fail: bool,
    }

    impl CountingCleanup {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CleanupJob for CountingCleanup {
        fn run(&self) -> Result<CleanupSummary, CleanupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CleanupError::Scan {
                    path: "logs".into(),
                    source: std::io::Error::other("permission denied"),
                });
            }
            Ok(CleanupSummary::default())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        lock: Arc<FileLock>,
        reports: Arc<FileReportRepository>,
        cleanup: Arc<CountingCleanup>,
        scheduler: PipelineScheduler,
    }

    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn fixture_from(start: NaiveDateTime, fail_at: Option<usize>, cleanup_fails: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let lock = Arc::new(FileLock::new(dir.path().join("pipeline.lock")));
        let reports = Arc::new(FileReportRepository::new(dir.path().join("report.json")));

        let mut orchestrator = Orchestrator::new(StepExecutor::default(), reports.clone());
        for (idx, name) in DEFAULT_STEPS.iter().enumerate() {
            let fails = fail_at == Some(idx);
            orchestrator = orchestrator.with_step(Arc::new(FnStep::new(*name, move || async move {
                if fails {
                    Err::<u64, _>(StepError::fatal("constraint violation"))
                } else {
                    Ok(100)
                }
            })));
        }

        let cleanup = CountingCleanup::new(cleanup_fails);
        let config = ScheduleConfig {
            run_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            prevent_concurrent: true,
        };
        let scheduler = PipelineScheduler::new(
            config,
            Duration::from_secs(30),
            lock.clone(),
            Arc::new(InProcessLauncher::new(Arc::new(orchestrator))),
            cleanup.clone(),
            start,
        );

        Fixture {
            _dir: dir,
            lock,
            reports,
            cleanup,
            scheduler,
        }
    }

    fn fixture(fail_at: Option<usize>, cleanup_fails: bool) -> Fixture {
        fixture_from(at(10, 1, 0), fail_at, cleanup_fails)
    }

    #[tokio::test]
    async fn test_idle_before_run_time() {
        let mut f = fixture(None, false);
        assert_eq!(f.scheduler.tick(at(10, 1, 30)).await, Tick::Idle);
        assert!(f.reports.load().unwrap().is_none());
        assert_eq!(f.cleanup.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_run_triggers_cleanup_once() {
        let mut f = fixture(None, false);

        let tick = f.scheduler.tick(at(10, 2, 0)).await;

        assert_eq!(tick, Tick::Triggered(TriggerOutcome::Succeeded));
        assert_eq!(f.cleanup.calls(), 1);
        assert!(!f.lock.is_held());
        assert_eq!(f.reports.load().unwrap().unwrap().status, RunStatus::Success);

        // Only once per day
        assert_eq!(f.scheduler.tick(at(10, 2, 1)).await, Tick::Idle);
        assert_eq!(f.scheduler.next_run(), at(11, 2, 0));
    }

    #[tokio::test]
    async fn test_failed_run_skips_cleanup_and_keeps_scheduling() {
        let mut f = fixture(Some(2), false);

        let tick = f.scheduler.tick(at(10, 2, 0)).await;

        assert_eq!(tick, Tick::Triggered(TriggerOutcome::Failed));
        assert_eq!(f.cleanup.calls(), 0);
        assert!(!f.lock.is_held());
        assert_eq!(f.reports.load().unwrap().unwrap().status, RunStatus::Failed);
        assert_eq!(f.scheduler.next_run(), at(11, 2, 0));
    }

    #[tokio::test]
    async fn test_held_lock_skips_trigger_and_writes_no_report() {
        let mut f = fixture(None, false);
        std::fs::write(f.lock.path(), "999").unwrap();

        let tick = f.scheduler.tick(at(10, 2, 0)).await;

        assert_eq!(tick, Tick::Triggered(TriggerOutcome::Skipped));
        assert!(f.reports.load().unwrap().is_none());
        assert_eq!(f.cleanup.calls(), 0);
        assert_eq!(f.lock.owner().as_deref(), Some("999"));
        // The skipped occurrence is not retried until the next day
        assert_eq!(f.scheduler.next_run(), at(11, 2, 0));
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_change_outcome() {
        let mut f = fixture(None, true);

        let tick = f.scheduler.tick(at(10, 2, 0)).await;

        assert_eq!(tick, Tick::Triggered(TriggerOutcome::Succeeded));
        assert_eq!(f.cleanup.calls(), 1);
        assert_eq!(f.reports.load().unwrap().unwrap().status, RunStatus::Success);
    }

    struct FullDisk;

    impl ReportRepository for FullDisk {
        fn save(&self, _report: &RunReport) -> Result<(), ReportError> {
            Err(ReportError::Io {
                path: "report.json".into(),
                source: std::io::Error::other("no space left on device"),
            })
        }

        fn load(&self) -> Result<Option<RunReport>, ReportError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_unwritten_report_skips_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let lock = Arc::new(FileLock::new(dir.path().join("pipeline.lock")));
        let orchestrator = Orchestrator::new(StepExecutor::default(), Arc::new(FullDisk))
            .with_step(Arc::new(FnStep::new("data_generation", || async {
                Ok::<u64, StepError>(100)
            })));
        let cleanup = CountingCleanup::new(false);
        let mut scheduler = PipelineScheduler::new(
            ScheduleConfig {
                run_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
                prevent_concurrent: true,
            },
            Duration::from_secs(30),
            lock.clone(),
            Arc::new(InProcessLauncher::new(Arc::new(orchestrator))),
            cleanup.clone(),
            at(10, 1, 0),
        );

        let tick = scheduler.tick(at(10, 2, 0)).await;

        assert_eq!(tick, Tick::Errored);
        assert_eq!(cleanup.calls(), 0);
        assert!(!lock.is_held());
        assert_eq!(scheduler.next_run(), at(11, 2, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_on_shutdown() {
        // First occurrence is days away, so polling stays idle
        let start = Local::now().naive_local() + chrono::TimeDelta::days(2);
        let f = fixture_from(start, None, false);
        f.scheduler
            .run(tokio::time::sleep(Duration::from_secs(95)))
            .await;
        assert_eq!(f.cleanup.calls(), 0);
        assert!(f.reports.load().unwrap().is_none());
    }
}
