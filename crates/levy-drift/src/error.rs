//! Drift detection error types.
//!
//! These never escape `monitor_and_alert`; they are rendered into the
//! `error` outcome's message.

use std::path::PathBuf;

use levy_core::errors::CoreError;
use levy_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriftError {
    /// The model artifact or dataset does not exist.
    #[error("{what} file not found: {}", path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
