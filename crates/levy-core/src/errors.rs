//! Cross-cutting error types.
//!
//! Component-specific errors (`ModelError`, `DriftError`, `RetrainError`) live
//! in their own crates. Failures that any component can hit while reading
//! datasets or touching durable state are defined here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A file or directory operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader or writer rejected the data.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A dataset cell could not be parsed as a number.
    #[error("Non-numeric value '{value}' in column '{column}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// A required column is absent from the dataset.
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// The dataset has no rows.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Data failed validation (shape, ranges, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
