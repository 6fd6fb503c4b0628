//! The persisted model artifact.
//!
//! Written only by the retrain pipeline via atomic replace; everything else
//! loads it with a whole-file read and never holds it open.

use std::path::Path;

use chrono::{DateTime, Utc};
use levy_core::dataset::{Dataset, FeatureMatrix};
use levy_core::errors::CoreError;
use levy_core::fs;
use levy_core::model_kind::ModelKind;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::{RegressionModel, Regressor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_version: u32,
    pub trained_at: DateTime<Utc>,
    /// Training column order; prediction input is matched by name.
    pub feature_names: Vec<String>,
    pub target_column: String,
    pub model: RegressionModel,
}

impl ModelArtifact {
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        self.model.kind()
    }

    /// Predict for a feature matrix whose columns may be in any order and
    /// may include extra columns.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingFeature` if a training feature is absent.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        let aligned = x.reorder(&self.feature_names).map_err(|e| match e {
            CoreError::MissingColumn(name) => ModelError::MissingFeature(name),
            other => ModelError::Core(other),
        })?;
        Ok(self.model.predict(&aligned))
    }

    /// Predict for every row of a dataset.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingFeature` if a training feature is absent.
    pub fn predict_dataset(&self, data: &Dataset) -> Result<Vec<f64>, ModelError> {
        let x = data.feature_matrix(&self.feature_names).map_err(|e| match e {
            CoreError::MissingColumn(name) => ModelError::MissingFeature(name),
            other => ModelError::Core(other),
        })?;
        Ok(self.model.predict(&x))
    }

    /// # Errors
    ///
    /// Returns `ModelError::Core` if the file is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(fs::read_json(path)?)
    }

    /// Atomically replace the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Core` if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        fs::write_json_atomic(path, self)?;
        tracing::info!(path = %path.display(), version = self.model_version, "model artifact saved");
        Ok(())
    }
}
