//! Data Transfer Objects
//!
//! Serializable views of domain types that leave the process, such as the
//! run report written after every pipeline execution.

pub mod report;
