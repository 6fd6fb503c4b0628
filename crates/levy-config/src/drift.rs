//! Drift detection thresholds.

use serde::{Deserialize, Serialize};

const fn default_threshold() -> f64 {
    5.0
}

const fn default_window_size() -> usize {
    30
}

const fn default_z_score_threshold() -> f64 {
    2.0
}

const fn default_relative_error_threshold() -> f64 {
    0.2
}

fn default_target_column() -> String {
    "forecast".to_string()
}

fn default_feature_columns() -> Vec<String> {
    ["region_encoded", "year", "previous_value", "growth_rate"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriftConfig {
    /// Absolute distance from the baseline mean that counts as value drift.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Explicit scalar baseline. When unset, the metrics snapshot's
    /// `baseline_mean` is used if present.
    #[serde(default)]
    pub baseline_mean: Option<f64>,

    /// Observation window size. Reserved.
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Per-feature z-score above which a feature has drifted.
    #[serde(default = "default_z_score_threshold")]
    pub z_score_threshold: f64,

    /// Relative MSE/MAE increase above which predictions have drifted.
    #[serde(default = "default_relative_error_threshold")]
    pub relative_error_threshold: f64,

    /// Column holding the value the model predicts.
    #[serde(default = "default_target_column")]
    pub target_column: String,

    /// Features monitored for distribution drift (absent ones are skipped).
    #[serde(default = "default_feature_columns")]
    pub feature_columns: Vec<String>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            baseline_mean: None,
            window_size: default_window_size(),
            z_score_threshold: default_z_score_threshold(),
            relative_error_threshold: default_relative_error_threshold(),
            target_column: default_target_column(),
            feature_columns: default_feature_columns(),
        }
    }
}
