//! Pipeline launchers
//!
//! How a trigger starts one pipeline execution: either by calling the
//! orchestrator in this process or by spawning the pipeline as a separate
//! process.

use anyhow::{Context, Result};
use async_trait::async_trait;
use shopflow_core::domain::run::RunStatus;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{error, info};

use crate::service::orchestrator::Orchestrator;

/// Starts one pipeline execution and reports its final status
#[async_trait]
pub trait PipelineLauncher: Send + Sync {
    async fn launch(&self) -> Result<RunStatus>;
}

/// Runs the orchestrator in the current process
pub struct InProcessLauncher {
    orchestrator: Arc<Orchestrator>,
}

impl InProcessLauncher {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl PipelineLauncher for InProcessLauncher {
    async fn launch(&self) -> Result<RunStatus> {
        let run = self.orchestrator.run().await?;
        Ok(run.status())
    }
}

/// Runs the pipeline as a child process
///
/// Exit status 0 means success; anything else is a failed run and the
/// child's stderr is logged.
pub struct ProcessLauncher {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessLauncher {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("launch command cannot be empty")?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: None,
        })
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl PipelineLauncher for ProcessLauncher {
    async fn launch(&self) -> Result<RunStatus> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        info!("Launching pipeline process: {} {:?}", self.program, self.args);

        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to spawn pipeline process '{}'", self.program))?;

        if output.status.success() {
            return Ok(RunStatus::Success);
        }

        error!("Pipeline process exited with {}", output.status);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            error!("{}", stderr.trim());
        }
        Ok(RunStatus::Failed)
    }
}
