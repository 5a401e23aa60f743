//! Run report DTO
//!
//! The structured document persisted after every run and read back by
//! monitoring and the CLI.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::domain::run::{DataQualitySummary, PipelineRun, RunStatus};
use crate::domain::step::StepResult;

/// Persisted report of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub pipeline_execution_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration_seconds: Option<f64>,
    pub status: RunStatus,
    pub steps_executed: StepsExecuted,
    pub data_quality_summary: DataQualitySummary,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<&PipelineRun> for RunReport {
    fn from(run: &PipelineRun) -> Self {
        Self {
            pipeline_execution_id: run.id().to_string(),
            start_time: run.start_time(),
            end_time: run.end_time(),
            total_duration_seconds: run.total_duration_seconds(),
            status: run.status(),
            steps_executed: StepsExecuted(run.steps().to_vec()),
            data_quality_summary: run.data_quality().clone(),
            errors: run.errors().to_vec(),
            warnings: run.warnings().to_vec(),
        }
    }
}

/// Step results keyed by step name, in execution order
///
/// Serialized as a JSON object whose key order is the order the steps ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepsExecuted(pub Vec<(String, StepResult)>);

impl StepsExecuted {
    pub fn get(&self, name: &str) -> Option<&StepResult> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StepsExecuted {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, result) in &self.0 {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StepsExecuted {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedSteps;

        impl<'de> Visitor<'de> for OrderedSteps {
            type Value = StepsExecuted;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of step name to step result")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut steps = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, result)) = access.next_entry::<String, StepResult>()? {
                    steps.push((name, result));
                }
                Ok(StepsExecuted(steps))
            }
        }

        deserializer.deserialize_map(OrderedSteps)
    }
}
