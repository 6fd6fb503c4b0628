//! Line-delimited log of every drift check.

use std::path::{Path, PathBuf};

use levy_core::drift::DriftCheckRecord;
use levy_core::errors::CoreError;
use levy_core::fs;

/// Appends one [`DriftCheckRecord`] per line to `drift_checks.json`.
///
/// This log, not the in-memory scheduler state, records when checks ran.
#[derive(Debug, Clone)]
pub struct DriftCheckLog {
    path: PathBuf,
}

impl DriftCheckLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// Returns `CoreError::Io` if the line cannot be appended.
    pub fn append(&self, record: &DriftCheckRecord) -> Result<(), CoreError> {
        fs::append_json_line(&self.path, record)
    }

    /// Every record, oldest first. A missing log has no records.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the log is unreadable or a line fails to decode.
    pub fn records(&self) -> Result<Vec<DriftCheckRecord>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        fs::read_json_lines(&self.path)
    }
}
