//! Error taxonomy for the timing harness.

use thiserror::Error;

/// Errors surfaced by the harness.
///
/// Individual task failures are deliberately absent: a panicking task is
/// swallowed by the cycle runner and a failing [`guarded`](crate::task::guarded)
/// task is logged and converted into `None`.
#[derive(Debug, Error)]
pub enum ClockError {
    /// The builder produced a configuration that violates an invariant.
    #[error("invalid configuration for `{field}`: {reason}")]
    ConfigInvalid { field: &'static str, reason: String },

    /// The caller-supplied task factory failed.
    #[error("task factory failed: {0}")]
    FactoryFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The runner lost contact with its workers while waiting on a cycle.
    #[error("cycle runner interrupted: {0}")]
    RunnerInterrupted(String),

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("unknown time unit '{0}'")]
    UnknownTimeUnit(String),

    #[error("unknown payload '{0}'")]
    UnknownPayload(String),
}

impl ClockError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ClockError::ConfigInvalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClockError>;
