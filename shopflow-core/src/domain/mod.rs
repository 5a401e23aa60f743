//! Core domain types
//!
//! These types describe one pipeline run and its steps. They are produced by
//! the runner's orchestrator and consumed by the report and monitoring side.

pub mod run;
pub mod schedule;
pub mod step;
