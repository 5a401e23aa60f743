//! Command-backed steps
//!
//! Runs a step as an external process. The process reports its record count
//! as the last non-empty line on stdout. Exit codes listed as transient
//! (75, `EX_TEMPFAIL`, by default) are retried; any other failure is fatal.

use async_trait::async_trait;
use shopflow_core::error::StepError;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use super::PipelineStep;

/// `EX_TEMPFAIL` from sysexits.h
pub const EX_TEMPFAIL: i32 = 75;

/// Step executed as an external command
pub struct CommandStep {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    transient_exit_codes: Vec<i32>,
}

impl CommandStep {
    /// Creates a step running `command[0]` with `command[1..]` as arguments
    pub fn new(name: impl Into<String>, command: &[String]) -> Result<Self, StepError> {
        let name = name.into();
        let (program, args) = command
            .split_first()
            .ok_or_else(|| StepError::fatal(format!("step '{}' has an empty command", name)))?;

        Ok(Self {
            name,
            program: program.clone(),
            args: args.to_vec(),
            working_dir: None,
            transient_exit_codes: vec![EX_TEMPFAIL],
        })
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_transient_exit_codes(mut self, codes: Vec<i32>) -> Self {
        self.transient_exit_codes = codes;
        self
    }

    fn parse_records(&self, stdout: &str) -> Result<u64, StepError> {
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(|line| line.parse::<u64>().ok())
            .ok_or_else(|| {
                StepError::fatal(format!("step '{}' produced no record count", self.name))
            })
    }
}

#[async_trait]
impl PipelineStep for CommandStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<u64, StepError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!("Spawning {} {:?} for step '{}'", self.program, self.args, self.name);

        let output = command.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.trim().is_empty() {
            debug!("step '{}' stderr: {}", self.name, stderr.trim());
        }

        if output.status.success() {
            return self.parse_records(&stdout);
        }

        match output.status.code() {
            Some(code) if self.transient_exit_codes.contains(&code) => Err(StepError::transient(
                format!("step '{}' exited with {}: {}", self.name, code, stderr.trim()),
            )),
            _ => Err(StepError::fatal(format!(
                "step '{}' failed ({}): {}",
                self.name,
                output.status,
                stderr.trim()
            ))),
        }
    }
}
