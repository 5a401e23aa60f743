//! Pipeline step collaborators
//!
//! A step is an opaque unit of work with a name and a record count. The
//! runner does not know what a step does; it only invokes it through
//! [`PipelineStep`] and classifies the failure it returns.

mod command;

pub use command::{CommandStep, EX_TEMPFAIL};

use async_trait::async_trait;
use shopflow_core::error::StepError;
use std::future::Future;

/// The six steps of the warehouse pipeline, in execution order
pub const DEFAULT_STEPS: [&str; 6] = [
    "data_generation",
    "data_ingestion",
    "data_quality_checks",
    "staging_to_production",
    "warehouse_load",
    "analytics_generation",
];

/// A named unit of pipeline work
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Step name, used as the report key and in logs
    fn name(&self) -> &str;

    /// Runs the step once, returning the number of records processed
    async fn run(&self) -> Result<u64, StepError>;
}

/// In-process step backed by an async closure
pub struct FnStep<F> {
    name: String,
    f: F,
}

impl<F> FnStep<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> PipelineStep for FnStep<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<u64, StepError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<u64, StepError> {
        (self.f)().await
    }
}
