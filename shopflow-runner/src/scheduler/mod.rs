//! Scheduler layer
//!
//! Decides when the pipeline runs: a cooperative poll loop that fires once
//! per day at the configured time.

pub mod daily;
pub mod poller;

pub use daily::DailySchedule;
pub use poller::{PipelineScheduler, Tick};
