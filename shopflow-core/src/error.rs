//! Step failure taxonomy

use std::io;
use thiserror::Error;

/// Failure class of a step error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Eligible for automatic retry (timeouts, dropped connections)
    Transient,
    /// Never retried, halts the run
    Fatal,
}

/// Error returned by a pipeline step
///
/// The variant is the retry decision: the executor retries `Transient`
/// failures with backoff and gives up immediately on `Fatal` ones.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0:#}")]
    Transient(anyhow::Error),

    #[error("{0:#}")]
    Fatal(anyhow::Error),
}

impl StepError {
    /// Creates a retryable error from a message
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(anyhow::anyhow!(message.into()))
    }

    /// Creates a non-retryable error from a message
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(anyhow::anyhow!(message.into()))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient(_) => FailureKind::Transient,
            Self::Fatal(_) => FailureKind::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Transient
    }

    /// The underlying error with its context chain
    pub fn inner(&self) -> &anyhow::Error {
        match self {
            Self::Transient(e) | Self::Fatal(e) => e,
        }
    }
}

impl From<anyhow::Error> for StepError {
    fn from(e: anyhow::Error) -> Self {
        Self::Fatal(e)
    }
}

impl From<io::Error> for StepError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::BrokenPipe => Self::Transient(e.into()),
            _ => Self::Fatal(e.into()),
        }
    }
}
