//! Training history ledger.
//!
//! Appends one CSV row per committed retrain to `training_history.csv`
//! (`timestamp,mse,mae,r2,model_version`). Rows are never rewritten. Row
//! timestamps are strictly increasing: a row stamped at or before the
//! previous row is moved to one microsecond after it.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use levy_core::errors::CoreError;
use levy_core::fs;
use levy_core::metrics::ModelMetrics;
use serde::{Deserialize, Serialize};

/// One committed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub timestamp: DateTime<Utc>,
    pub mse: f64,
    pub mae: f64,
    #[serde(rename = "r2")]
    pub r_squared: f64,
    pub model_version: u32,
}

impl From<&ModelMetrics> for LedgerRow {
    fn from(m: &ModelMetrics) -> Self {
        Self {
            timestamp: m.timestamp,
            mse: m.mse,
            mae: m.mae,
            r_squared: m.r_squared,
            model_version: m.model_version,
        }
    }
}

/// Append-only CSV ledger of training runs.
#[derive(Debug, Clone)]
pub struct TrainingHistoryLedger {
    path: PathBuf,
}

impl TrainingHistoryLedger {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row in file order. A missing ledger has no rows.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the file is unreadable or a row is malformed.
    pub fn rows(&self) -> Result<Vec<LedgerRow>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        reader
            .deserialize()
            .collect::<Result<Vec<LedgerRow>, _>>()
            .map_err(CoreError::from)
    }

    /// Version number for the next committed model.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the ledger cannot be read.
    pub fn next_version(&self) -> Result<u32, CoreError> {
        version_after(&self.rows()?)
    }

    /// Version and timestamp the next row will be stored with if it is
    /// stamped `now`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the ledger cannot be read.
    pub fn next_entry(&self, now: DateTime<Utc>) -> Result<(u32, DateTime<Utc>), CoreError> {
        let rows = self.rows()?;
        Ok((version_after(&rows)?, stamp_after(rows.last(), now)))
    }

    /// Append `row`, writing the header first if the ledger is new.
    ///
    /// Returns the row as stored, with its timestamp possibly bumped.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the ledger cannot be read or appended to.
    pub fn append(&self, mut row: LedgerRow) -> Result<LedgerRow, CoreError> {
        row.timestamp = stamp_after(self.rows()?.last(), row.timestamp);

        fs::ensure_parent(&self.path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CoreError::io(&self.path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| CoreError::io(&self.path, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(&row)?;
        writer.flush().map_err(|e| CoreError::io(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            model_version = row.model_version,
            "appended training history row"
        );
        Ok(row)
    }
}

fn version_after(rows: &[LedgerRow]) -> Result<u32, CoreError> {
    let count = rows.len();
    u32::try_from(count + 1)
        .map_err(|_| CoreError::Validation(format!("ledger has too many rows ({count})")))
}

fn stamp_after(last: Option<&LedgerRow>, candidate: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(last) if candidate <= last.timestamp => last.timestamp + Duration::microseconds(1),
        _ => candidate,
    }
}
