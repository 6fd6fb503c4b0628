//! Drift detection results.
//!
//! All flags are native booleans so the line-delimited drift check log can be
//! consumed without string-to-bool coercion.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::ModelMetrics;

/// Outcome of comparing one scalar against the configured baseline mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ValueDrift {
    /// No baseline is available, so drift cannot be judged either way.
    Undetermined,
    /// `|value - baseline| <= threshold`.
    Stable { magnitude: f64 },
    /// `|value - baseline| > threshold`.
    Drifted { magnitude: f64 },
}

impl ValueDrift {
    #[must_use]
    pub const fn is_drift(&self) -> bool {
        matches!(self, Self::Drifted { .. })
    }

    #[must_use]
    pub const fn is_undetermined(&self) -> bool {
        matches!(self, Self::Undetermined)
    }

    #[must_use]
    pub const fn magnitude(&self) -> f64 {
        match self {
            Self::Undetermined => 0.0,
            Self::Stable { magnitude } | Self::Drifted { magnitude } => *magnitude,
        }
    }

    /// `(drift_detected, magnitude)`; `Undetermined` maps to `(false, 0.0)`.
    #[must_use]
    pub const fn as_tuple(&self) -> (bool, f64) {
        (self.is_drift(), self.magnitude())
    }
}

/// Per-feature comparison of reference and current distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub reference_mean: f64,
    pub reference_std: f64,
    pub current_mean: f64,
    pub current_std: f64,
    pub z_score: f64,
    pub drift_detected: bool,
}

/// Result of a feature-distribution drift check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionDrift {
    pub drift_detected: bool,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureDrift>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DistributionDrift {
    /// A check that could not run. Reports no drift, with the reason.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            drift_detected: false,
            features: BTreeMap::new(),
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// Result of a prediction-error drift check.
///
/// Reference fields are `None` when no metrics snapshot exists yet; in that
/// case `drift_detected` is `false` because there is no history to compare
/// against, not because the model was judged healthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDrift {
    pub drift_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_mse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_mae: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mae: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mse_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mae_change: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionDrift {
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            drift_detected: false,
            reference_mse: None,
            reference_mae: None,
            current_mse: None,
            current_mae: None,
            mse_change: None,
            mae_change: None,
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Whether a reference snapshot was available for comparison.
    #[must_use]
    pub const fn has_reference(&self) -> bool {
        self.reference_mse.is_some()
    }
}

/// Combined result of one monitoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftCheckResult {
    pub drift_detected: bool,
    pub distribution_drift: DistributionDrift,
    pub prediction_drift: PredictionDrift,
    pub timestamp: DateTime<Utc>,
    pub next_check_time: DateTime<Utc>,
}

/// A monitoring pass that could not complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorFailure {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// What `monitor_and_alert` returns. Serialized with a `status` tag of
/// `ok`, `alert`, or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonitorOutcome {
    Ok(DriftCheckResult),
    Alert(DriftCheckResult),
    Error(MonitorFailure),
}

impl MonitorOutcome {
    #[must_use]
    pub fn from_check(check: DriftCheckResult) -> Self {
        if check.drift_detected {
            Self::Alert(check)
        } else {
            Self::Ok(check)
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(MonitorFailure {
            message: message.into(),
            timestamp: Utc::now(),
        })
    }

    #[must_use]
    pub const fn drift_detected(&self) -> bool {
        matches!(self, Self::Alert(_))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub const fn check(&self) -> Option<&DriftCheckResult> {
        match self {
            Self::Ok(check) | Self::Alert(check) => Some(check),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::Alert(_) => "alert",
            Self::Error(_) => "error",
        }
    }
}

/// One line of the drift check log, written by the scheduler after every
/// check, including failed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftCheckRecord {
    pub check: MonitorOutcome,
    pub retraining_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retraining_success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retraining_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrain_metrics: Option<ModelMetrics>,
    pub last_check_time: DateTime<Utc>,
    pub next_check_time: DateTime<Utc>,
}
