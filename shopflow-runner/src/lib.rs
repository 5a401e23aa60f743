//! Shopflow Runner
//!
//! Runs the warehouse pipeline: a fixed sequence of steps executed with
//! retry, a lock against overlapping runs, a JSON report per run and a
//! daily scheduler that triggers it.
//!
//! Architecture:
//! - Configuration: YAML file plus environment overrides
//! - Repositories: lock marker and run report on the local filesystem
//! - Services: step executor, orchestrator, launchers, retention cleanup
//! - Scheduler: daily polling loop

pub mod bootstrap;
pub mod config;
pub mod logging;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod step;
