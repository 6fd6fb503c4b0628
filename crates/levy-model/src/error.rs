//! Model error types.

use thiserror::Error;

use levy_core::errors::CoreError;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Training input has no rows or mismatched lengths.
    #[error("Invalid training input: {0}")]
    InvalidInput(String),

    /// Prediction input lacks a feature the model was trained on.
    #[error("Feature '{0}' required by the model is missing")]
    MissingFeature(String),

    /// Training stopped because cancellation was requested.
    #[error("Training cancelled")]
    Cancelled,

    /// Reading or writing the artifact failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
