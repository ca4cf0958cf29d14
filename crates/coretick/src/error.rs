//! Error types for instance lifecycle operations.
//!
//! Every lifecycle call returns its outcome directly to the caller; nothing
//! is retried internally. The worker loop never surfaces callback or clock
//! failures as instance-level errors.

use thiserror::Error;

/// Errors produced by the instance lifecycle API.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Configuration rejected at instance creation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The thread/scheduler facility refused to spawn or configure the
    /// worker, e.g. insufficient privilege for the requested real-time class.
    #[error("failed to start worker thread: {0}")]
    Start(String),

    /// `run` was called more than once on the same instance.
    #[error("worker thread already started")]
    AlreadyStarted,

    /// `join` or `terminate` was called before `run`.
    #[error("worker thread not started")]
    NotStarted,

    /// `join` was called after the thread handle was already consumed.
    #[error("worker thread already joined")]
    AlreadyJoined,

    /// The worker thread died by panic or forced cancellation instead of
    /// exiting its loop cleanly. The thread has still been reaped.
    #[error("worker thread panicked or was cancelled before exiting cleanly")]
    WorkerPanicked,

    /// Forced cancellation of the worker thread failed.
    #[error("failed to terminate worker thread: {0}")]
    Terminate(String),

    /// Forced cancellation is not available on this platform.
    #[error("forced termination is not supported on this platform")]
    TerminateUnsupported,

    /// `destroy` was called before the worker thread was joined.
    #[error("instance is busy: worker thread has not been joined")]
    Busy,
}

impl CoreError {
    /// Create an invalid-configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result alias for lifecycle operations.
pub type CoreResult<T = ()> = Result<T, CoreError>;
