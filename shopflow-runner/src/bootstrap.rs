//! Builds runner components from [`Config`]

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::config::Config;
use crate::repository::{FileLock, FileReportRepository};
use crate::scheduler::PipelineScheduler;
use crate::service::{
    InProcessLauncher, Orchestrator, PipelineLauncher, ProcessLauncher, RetentionCleanup,
    StepExecutor,
};
use crate::step::CommandStep;

pub fn lock(config: &Config) -> Arc<FileLock> {
    Arc::new(FileLock::new(&config.paths.lock_file))
}

pub fn reports(config: &Config) -> Arc<FileReportRepository> {
    Arc::new(FileReportRepository::new(&config.paths.report_file))
}

pub fn cleanup(config: &Config) -> Arc<RetentionCleanup> {
    Arc::new(RetentionCleanup::new(
        config.retention.target_dirs.clone(),
        config.retention.days,
        config.retention.preserve_keywords.clone(),
    ))
}

/// One command step per configured step, in configuration order
pub fn orchestrator(config: &Config) -> Result<Orchestrator> {
    let mut orchestrator = Orchestrator::new(StepExecutor::new(config.retry_policy()), reports(config));

    for step in &config.steps {
        let mut command = CommandStep::new(step.name.clone(), &step.command)
            .with_context(|| format!("Invalid step '{}'", step.name))?
            .with_transient_exit_codes(config.executor.transient_exit_codes.clone());
        if let Some(dir) = &step.working_dir {
            command = command.with_working_dir(dir);
        }
        orchestrator = orchestrator.with_step(Arc::new(command));
    }

    Ok(orchestrator)
}

/// External command if `launch_command` is set, otherwise in-process
pub fn launcher(config: &Config) -> Result<Arc<dyn PipelineLauncher>> {
    match &config.scheduler.launch_command {
        Some(command) => Ok(Arc::new(ProcessLauncher::new(command)?)),
        None => Ok(Arc::new(InProcessLauncher::new(Arc::new(orchestrator(config)?)))),
    }
}

pub fn scheduler(config: &Config, now: NaiveDateTime) -> Result<PipelineScheduler> {
    Ok(PipelineScheduler::new(
        config.schedule()?,
        config.poll_interval(),
        lock(config),
        launcher(config)?,
        cleanup(config),
        now,
    ))
}
