//! Model evaluation metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model_kind::ModelKind;

/// Error measures computed on the held-out test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    #[serde(rename = "r2")]
    pub r_squared: f64,
}

/// The current metrics snapshot persisted next to the model artifact.
///
/// Overwritten on every successful retrain. `DriftDetector` uses it as the
/// prediction-error baseline and, via `baseline_mean`, as the scalar baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    #[serde(rename = "r2")]
    pub r_squared: f64,
    pub model_version: u32,
    pub model_type: ModelKind,
    pub timestamp: DateTime<Utc>,
    /// Mean of the training target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_mean: Option<f64>,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl ModelMetrics {
    #[must_use]
    pub const fn evaluation(&self) -> EvaluationMetrics {
        EvaluationMetrics {
            mse: self.mse,
            rmse: self.rmse,
            mae: self.mae,
            r_squared: self.r_squared,
        }
    }
}

/// The subset of a metrics file needed as a drift baseline.
///
/// Every field is optional so that hand-written or older snapshots still
/// load. A missing `mae` falls back to `mse` (see [`Self::reference_mae`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMetrics {
    #[serde(default)]
    pub mse: Option<f64>,
    #[serde(default)]
    pub mae: Option<f64>,
    #[serde(default)]
    pub baseline_mean: Option<f64>,
}

impl ReferenceMetrics {
    #[must_use]
    pub fn reference_mae(&self) -> Option<f64> {
        self.mae.or(self.mse)
    }
}
