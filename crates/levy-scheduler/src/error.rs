//! Scheduler error types.

use levy_core::errors::CoreError;
use levy_retrain::RetrainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyRunning,

    /// A check or retrain task panicked or was aborted.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Retrain exceeded the {minutes} minute limit and was cancelled")]
    RetrainTimeout { minutes: f64 },

    #[error(transparent)]
    Retrain(#[from] RetrainError),

    /// Drift was found after shutdown had been requested.
    #[error("Retraining skipped: scheduler is shutting down")]
    ShuttingDown,

    /// Writing the drift check log failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
