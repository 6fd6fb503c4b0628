//! The drift detector.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use levy_config::LevyConfig;
use levy_core::dataset::Dataset;
use levy_core::drift::{
    DistributionDrift, DriftCheckResult, FeatureDrift, MonitorOutcome, PredictionDrift, ValueDrift,
};
use levy_core::fs;
use levy_core::metrics::ReferenceMetrics;
use levy_core::stats;
use levy_model::ModelArtifact;
use tracing::{error, info, warn};

use crate::error::DriftError;

pub const DEFAULT_THRESHOLD: f64 = 5.0;
pub const DEFAULT_WINDOW_SIZE: usize = 30;
pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = 2.0;
pub const DEFAULT_RELATIVE_ERROR_THRESHOLD: f64 = 0.2;
pub const DEFAULT_TARGET_COLUMN: &str = "forecast";
pub const DEFAULT_REFERENCE_DATA_PATH: &str = "data/levy_training_data.csv";
pub const DEFAULT_FEATURE_COLUMNS: [&str; 4] =
    ["region_encoded", "year", "previous_value", "growth_rate"];

/// Stateless comparator between a reference (baseline value, dataset, or
/// metrics snapshot) and newly observed data.
///
/// Holds only read paths. The metrics snapshot is re-read on every
/// prediction check, so a detector built before a retrain sees the new
/// baseline afterwards.
#[derive(Debug, Clone)]
pub struct DriftDetector {
    baseline_mean: Option<f64>,
    threshold: f64,
    model_path: PathBuf,
    metrics_path: PathBuf,
    reference_data_path: PathBuf,
    window_size: usize,
    z_score_threshold: f64,
    relative_error_threshold: f64,
    target_column: String,
    feature_columns: Vec<String>,
}

impl DriftDetector {
    /// Create a detector with default thresholds.
    ///
    /// If `metrics_path` exists and records a `baseline_mean`, it becomes the
    /// scalar baseline. An unreadable snapshot is logged and ignored.
    pub fn new(model_path: impl Into<PathBuf>, metrics_path: impl Into<PathBuf>) -> Self {
        let metrics_path = metrics_path.into();
        let baseline_mean = if metrics_path.exists() {
            load_reference(&metrics_path).and_then(|m| m.baseline_mean)
        } else {
            None
        };
        if let Some(mean) = baseline_mean {
            info!(baseline_mean = mean, "loaded baseline mean from metrics");
        }

        Self {
            baseline_mean,
            threshold: DEFAULT_THRESHOLD,
            model_path: model_path.into(),
            metrics_path,
            reference_data_path: PathBuf::from(DEFAULT_REFERENCE_DATA_PATH),
            window_size: DEFAULT_WINDOW_SIZE,
            z_score_threshold: DEFAULT_Z_SCORE_THRESHOLD,
            relative_error_threshold: DEFAULT_RELATIVE_ERROR_THRESHOLD,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            feature_columns: DEFAULT_FEATURE_COLUMNS.map(String::from).to_vec(),
        }
    }

    /// Build a detector from loaded configuration.
    #[must_use]
    pub fn from_config(config: &LevyConfig) -> Self {
        let drift = &config.drift;
        let mut detector = Self::new(&config.paths.model_path, config.paths.metrics_path())
            .with_threshold(drift.threshold)
            .with_window_size(drift.window_size)
            .with_z_score_threshold(drift.z_score_threshold)
            .with_relative_error_threshold(drift.relative_error_threshold)
            .with_target_column(&drift.target_column)
            .with_feature_columns(drift.feature_columns.clone())
            .with_reference_data_path(&config.paths.reference_data_path);
        if let Some(mean) = drift.baseline_mean {
            detector = detector.with_baseline_mean(mean);
        }
        detector
    }

    /// An explicit baseline always wins over one loaded from metrics.
    #[must_use]
    pub fn with_baseline_mean(mut self, mean: f64) -> Self {
        self.baseline_mean = Some(mean);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    #[must_use]
    pub fn with_z_score_threshold(mut self, z: f64) -> Self {
        self.z_score_threshold = z;
        self
    }

    #[must_use]
    pub fn with_relative_error_threshold(mut self, ratio: f64) -> Self {
        self.relative_error_threshold = ratio;
        self
    }

    #[must_use]
    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    #[must_use]
    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = columns;
        self
    }

    #[must_use]
    pub fn with_reference_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_data_path = path.into();
        self
    }

    #[must_use]
    pub const fn baseline_mean(&self) -> Option<f64> {
        self.baseline_mean
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    #[must_use]
    pub fn metrics_path(&self) -> &Path {
        &self.metrics_path
    }

    /// Compare a single value against the baseline mean.
    ///
    /// Drift iff `|new_value - baseline| > threshold` (strict). Without a
    /// baseline the result is `Undetermined`, not `Stable`.
    #[must_use]
    pub fn check_value_drift(&self, new_value: f64) -> ValueDrift {
        let Some(baseline) = self.baseline_mean else {
            warn!("no baseline mean available for comparison");
            return ValueDrift::Undetermined;
        };

        let magnitude = (new_value - baseline).abs();
        if magnitude > self.threshold {
            warn!(value = new_value, baseline, drift = magnitude, "value drift detected");
            ValueDrift::Drifted { magnitude }
        } else {
            ValueDrift::Stable { magnitude }
        }
    }

    /// Compare per-feature means of `new_data` against a reference dataset.
    ///
    /// For each monitored feature present in both datasets,
    /// `z = |new_mean - ref_mean| / ref_std` (a zero `ref_std` counts as 1.0)
    /// and the feature drifts when `z` exceeds the z-score threshold. Overall
    /// drift is the OR of the per-feature flags.
    ///
    /// Without `reference_data` the canonical reference file is loaded; if
    /// that fails the result carries the error and reports no drift.
    #[must_use]
    pub fn check_distribution_drift(
        &self,
        new_data: &Dataset,
        reference_data: Option<&Dataset>,
        feature_columns: Option<&[String]>,
    ) -> DistributionDrift {
        let loaded;
        let reference = match reference_data {
            Some(reference) => reference,
            None => match Dataset::from_csv_path(&self.reference_data_path) {
                Ok(data) => {
                    loaded = data;
                    &loaded
                }
                Err(e) => {
                    error!(path = %self.reference_data_path.display(), %e, "error loading reference data");
                    return DistributionDrift::failed(e.to_string());
                }
            },
        };

        let columns = feature_columns.unwrap_or(&self.feature_columns);
        let mut features = BTreeMap::new();
        let mut drift_detected = false;

        for name in columns {
            let (Some(current), Some(baseline)) = (new_data.column(name), reference.column(name))
            else {
                continue;
            };

            let reference_mean = stats::mean(baseline);
            let reference_std = stats::sample_std(baseline);
            let current_mean = stats::mean(current);
            let current_std = stats::sample_std(current);
            let scale = if reference_std > 0.0 { reference_std } else { 1.0 };
            let z_score = (current_mean - reference_mean).abs() / scale;
            let feature_drift = z_score > self.z_score_threshold;

            if feature_drift {
                drift_detected = true;
                warn!(
                    feature = %name,
                    z_score,
                    threshold = self.z_score_threshold,
                    "distribution drift detected"
                );
            }

            features.insert(
                name.clone(),
                FeatureDrift {
                    reference_mean,
                    reference_std,
                    current_mean,
                    current_std,
                    z_score,
                    drift_detected: feature_drift,
                },
            );
        }

        DistributionDrift {
            drift_detected,
            features,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Compare the model's current prediction error on `new_data` against
    /// the reference metrics snapshot.
    ///
    /// Drift when the relative MSE or MAE increase exceeds the threshold.
    /// Without a snapshot the current errors are reported with
    /// `drift_detected = false`: there is no history to judge against.
    #[must_use]
    pub fn check_prediction_drift(
        &self,
        model: &ModelArtifact,
        new_data: &Dataset,
        target_column: Option<&str>,
    ) -> PredictionDrift {
        let target = target_column.unwrap_or(&self.target_column);
        let (features, observed) = match new_data.split_target(target) {
            Ok(split) => split,
            Err(e) => {
                error!(target, "target column not found in data");
                return PredictionDrift::failed(e.to_string());
            }
        };

        let predicted = match model.predict(&features) {
            Ok(p) => p,
            Err(e) => {
                error!(%e, "prediction failed during drift check");
                return PredictionDrift::failed(e.to_string());
            }
        };

        let mse = stats::mean_squared_error(&observed, &predicted);
        let mae = stats::mean_absolute_error(&observed, &predicted);

        let reference = if self.metrics_path.exists() {
            load_reference(&self.metrics_path).unwrap_or_default()
        } else {
            ReferenceMetrics::default()
        };

        let (Some(ref_mse), Some(ref_mae)) = (reference.mse, reference.reference_mae()) else {
            warn!("no reference metrics available, prediction drift undetermined");
            return PredictionDrift {
                drift_detected: false,
                reference_mse: None,
                reference_mae: None,
                current_mse: Some(mse),
                current_mae: Some(mae),
                mse_change: None,
                mae_change: None,
                timestamp: Utc::now(),
                error: None,
            };
        };

        let mse_change = stats::relative_change(mse, ref_mse);
        let mae_change = stats::relative_change(mae, ref_mae);
        let drift_detected =
            mse_change > self.relative_error_threshold || mae_change > self.relative_error_threshold;

        if drift_detected {
            warn!(mse_change, mae_change, "prediction drift detected");
        }

        PredictionDrift {
            drift_detected,
            reference_mse: Some(ref_mse),
            reference_mae: Some(ref_mae),
            current_mse: Some(mse),
            current_mae: Some(mae),
            mse_change: Some(mse_change),
            mae_change: Some(mae_change),
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Run both drift checks against the dataset at `data_path`.
    ///
    /// On detected drift, `alert_callback` runs before this returns. Every
    /// failure becomes an `Error` outcome; this never panics on bad input
    /// and never returns `Err`, since it runs inside an unattended loop.
    pub fn monitor_and_alert(
        &self,
        data_path: &Path,
        alert_callback: Option<&dyn Fn(&DriftCheckResult)>,
        check_interval: Duration,
    ) -> MonitorOutcome {
        match self.run_checks(data_path, check_interval) {
            Ok(check) => {
                if check.drift_detected {
                    if let Some(alert) = alert_callback {
                        alert(&check);
                    }
                }
                MonitorOutcome::from_check(check)
            }
            Err(e) => {
                error!(%e, "error in drift monitoring");
                MonitorOutcome::error(e.to_string())
            }
        }
    }

    fn run_checks(
        &self,
        data_path: &Path,
        check_interval: Duration,
    ) -> Result<DriftCheckResult, DriftError> {
        if !self.model_path.exists() {
            return Err(DriftError::MissingInput {
                what: "Model",
                path: self.model_path.clone(),
            });
        }
        if !data_path.exists() {
            return Err(DriftError::MissingInput {
                what: "Data",
                path: data_path.to_path_buf(),
            });
        }

        let model = ModelArtifact::load(&self.model_path)?;
        let data = Dataset::from_csv_path(data_path)?;

        let distribution_drift = self.check_distribution_drift(&data, None, None);
        let prediction_drift = self.check_prediction_drift(&model, &data, None);
        let drift_detected = distribution_drift.drift_detected || prediction_drift.drift_detected;

        let timestamp = Utc::now();
        Ok(DriftCheckResult {
            drift_detected,
            distribution_drift,
            prediction_drift,
            timestamp,
            next_check_time: timestamp + check_interval,
        })
    }
}

fn load_reference(path: &Path) -> Option<ReferenceMetrics> {
    match fs::read_json::<ReferenceMetrics>(path) {
        Ok(reference) => Some(reference),
        Err(e) => {
            error!(path = %path.display(), %e, "error loading metrics");
            None
        }
    }
}
