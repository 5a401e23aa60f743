//! Repository layer
//!
//! Repositories own the persistent state shared across runs and processes:
//! the execution lock marker and the latest run report.

pub mod lock;
pub mod report;

pub use lock::{FileLock, LockError, LockGuard, LockMarker};
pub use report::{FileReportRepository, ReportError, ReportRepository};
