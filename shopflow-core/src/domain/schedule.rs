//! Schedule configuration

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// When the pipeline runs and whether overlapping runs are allowed
///
/// Loaded once at process start and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub run_time: NaiveTime,
    pub prevent_concurrent: bool,
}

impl ScheduleConfig {
    /// Parses a `HH:MM` (24h) run time
    pub fn parse_run_time(value: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M")
    }
}
