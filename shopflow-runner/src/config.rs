//! Runner configuration
//!
//! Loaded once at startup from a YAML file, then adjusted by environment
//! overrides. Every section has defaults, so a missing file is not an error.
//!
//! ```yaml
//! scheduler:
//!   run_time: "02:00"
//!   prevent_concurrent: true
//! steps:
//!   - name: data_generation
//!     command: ["./scripts/data_generation.sh"]
//! retention:
//!   days: 7
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shopflow_core::domain::schedule::ScheduleConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::service::RetryPolicy;
use crate::step::{DEFAULT_STEPS, EX_TEMPFAIL};

/// Full runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default = "default_steps")]
    pub steps: Vec<StepConfig>,
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            paths: PathsConfig::default(),
            executor: ExecutorConfig::default(),
            steps: default_steps(),
            retention: RetentionConfig::default(),
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The file was absent
    Defaults(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults(path) => {
                write!(f, "defaults (no config file at {})", path.display())
            }
        }
    }
}

/// When and how the pipeline is triggered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Daily run time, `HH:MM` (24h)
    #[serde(default = "default_run_time")]
    pub run_time: String,
    #[serde(default = "default_true")]
    pub prevent_concurrent: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Run the pipeline as this command instead of in-process
    #[serde(default)]
    pub launch_command: Option<Vec<String>>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            run_time: default_run_time(),
            prevent_concurrent: true,
            poll_interval_secs: default_poll_interval_secs(),
            launch_command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,
    #[serde(default = "default_report_file")]
    pub report_file: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            lock_file: default_lock_file(),
            report_file: default_report_file(),
            log_dir: default_log_dir(),
        }
    }
}

/// Retry behavior of the step executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    /// Exit codes of command steps that count as transient failures
    #[serde(default = "default_transient_exit_codes")]
    pub transient_exit_codes: Vec<i32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            transient_exit_codes: default_transient_exit_codes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    pub command: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_days")]
    pub days: u32,
    #[serde(default = "default_preserve_keywords")]
    pub preserve_keywords: Vec<String>,
    #[serde(default = "default_target_dirs")]
    pub target_dirs: Vec<PathBuf>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_retention_days(),
            preserve_keywords: default_preserve_keywords(),
            target_dirs: default_target_dirs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_run_time() -> String {
    "02:00".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_lock_file() -> PathBuf {
    PathBuf::from("pipeline.lock")
}

fn default_report_file() -> PathBuf {
    PathBuf::from("data/processed/pipeline_execution_report.json")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    1
}

fn default_transient_exit_codes() -> Vec<i32> {
    vec![EX_TEMPFAIL]
}

fn default_steps() -> Vec<StepConfig> {
    DEFAULT_STEPS
        .iter()
        .map(|name| StepConfig {
            name: name.to_string(),
            command: vec![format!("scripts/{}.sh", name)],
            working_dir: None,
        })
        .collect()
}

fn default_retention_days() -> u32 {
    7
}

fn default_preserve_keywords() -> Vec<String> {
    vec!["report".to_string(), "summary".to_string()]
}

fn default_target_dirs() -> Vec<PathBuf> {
    ["data/raw", "data/staging", "logs"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

impl Config {
    /// Parses a configuration document
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse configuration")
    }

    /// Loads the configuration file, falling back to defaults if it is absent
    ///
    /// Environment overrides are applied and the result is validated. The
    /// returned source is meant to be logged once logging is up.
    pub fn load(path: &Path) -> Result<(Self, ConfigSource)> {
        let (mut config, source) = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            (Self::from_yaml(&content)?, ConfigSource::File(path.to_path_buf()))
        } else {
            (Self::default(), ConfigSource::Defaults(path.to_path_buf()))
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok((config, source))
    }

    /// Applies overrides:
    /// - SHOPFLOW_RUN_TIME (HH:MM)
    /// - SHOPFLOW_PREVENT_CONCURRENT (true/false)
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(run_time) = var("SHOPFLOW_RUN_TIME") {
            self.scheduler.run_time = run_time;
        }

        if let Some(value) = var("SHOPFLOW_PREVENT_CONCURRENT") {
            self.scheduler.prevent_concurrent = value
                .trim()
                .parse()
                .with_context(|| format!("SHOPFLOW_PREVENT_CONCURRENT must be true or false, got '{}'", value))?;
        }

        Ok(())
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        ScheduleConfig::parse_run_time(&self.scheduler.run_time).with_context(|| {
            format!(
                "scheduler.run_time must be HH:MM (24h), got '{}'",
                self.scheduler.run_time
            )
        })?;

        if self.scheduler.poll_interval_secs == 0 {
            anyhow::bail!("scheduler.poll_interval_secs must be greater than 0");
        }

        if matches!(&self.scheduler.launch_command, Some(cmd) if cmd.is_empty()) {
            anyhow::bail!("scheduler.launch_command cannot be empty");
        }

        if self.paths.lock_file.as_os_str().is_empty() {
            anyhow::bail!("paths.lock_file cannot be empty");
        }

        if self.paths.report_file.as_os_str().is_empty() {
            anyhow::bail!("paths.report_file cannot be empty");
        }

        if self.steps.is_empty() {
            anyhow::bail!("at least one step must be configured");
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.name.trim().is_empty() {
                anyhow::bail!("step names cannot be empty");
            }
            if step.command.is_empty() {
                anyhow::bail!("step '{}' has an empty command", step.name);
            }
            if !seen.insert(step.name.as_str()) {
                anyhow::bail!("step '{}' is configured more than once", step.name);
            }
        }

        Ok(())
    }

    /// The schedule settings, fixed for the process lifetime
    pub fn schedule(&self) -> Result<ScheduleConfig> {
        let run_time = ScheduleConfig::parse_run_time(&self.scheduler.run_time)
            .with_context(|| format!("invalid run_time '{}'", self.scheduler.run_time))?;

        Ok(ScheduleConfig {
            run_time,
            prevent_concurrent: self.scheduler.prevent_concurrent,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.poll_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.executor.max_retries,
            Duration::from_secs(self.executor.backoff_base_secs),
        )
    }
}
