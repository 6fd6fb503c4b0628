//! Retrain error types.

use std::path::PathBuf;

use levy_core::errors::CoreError;
use levy_model::ModelError;
use thiserror::Error;

/// Errors from a retrain run.
///
/// Variants split into two classes. Training failures (`Data`,
/// `InsufficientRows`, `Model`, `Cancelled`) happen before anything is
/// written. Persistence failures (`ArtifactWrite`, `Persistence`,
/// `LedgerAppend`) happen while committing and may leave the durable state
/// partially updated.
#[derive(Debug, Error)]
pub enum RetrainError {
    /// The dataset could not be read or split.
    #[error("Failed to load training data from {}: {source}", path.display())]
    Data {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    /// Too few rows for a non-empty train and test split.
    #[error("Dataset has {rows} rows, at least {min} are required")]
    InsufficientRows { rows: usize, min: usize },

    /// Fitting the model failed.
    #[error("Model training failed: {0}")]
    Model(#[source] ModelError),

    /// The run was cancelled before commit.
    #[error("Retrain cancelled before commit")]
    Cancelled,

    /// Writing the model artifact failed. The previous artifact is intact.
    #[error("Failed to write model artifact: {0}")]
    ArtifactWrite(#[source] ModelError),

    /// Reading or writing the metrics snapshot or ledger failed.
    #[error("Failed to persist {what}: {source}")]
    Persistence {
        what: &'static str,
        #[source]
        source: CoreError,
    },

    /// The artifact and snapshot were committed but the ledger row was not.
    #[error("Model artifact committed but training history append failed, ledger is out of sync: {0}")]
    LedgerAppend(#[source] CoreError),
}

impl RetrainError {
    /// Whether the failure happened while committing results.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::ArtifactWrite(_) | Self::Persistence { .. } | Self::LedgerAppend(_)
        )
    }
}

impl From<ModelError> for RetrainError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Cancelled => Self::Cancelled,
            other => Self::Model(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_model_error_maps_to_cancelled() {
        let err = RetrainError::from(ModelError::Cancelled);
        assert!(matches!(err, RetrainError::Cancelled));
        assert!(!err.is_persistence());
    }

    #[test]
    fn ledger_append_is_persistence_failure() {
        let err = RetrainError::LedgerAppend(CoreError::EmptyDataset);
        assert!(err.is_persistence());
        assert!(err.to_string().contains("out of sync"));
    }
}
