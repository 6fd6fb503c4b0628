//! The retrain pipeline.

use std::path::{Path, PathBuf};

use chrono::Utc;
use levy_config::{LevyConfig, sibling};
use levy_core::cancel::CancelFlag;
use levy_core::dataset::{Dataset, FeatureMatrix, TrainTestSplit};
use levy_core::errors::CoreError;
use levy_core::fs;
use levy_core::metrics::{EvaluationMetrics, ModelMetrics};
use levy_core::model_kind::ModelKind;
use levy_core::stats;
use levy_model::{ModelArtifact, RegressionModel, Regressor};
use tracing::{error, info};

use crate::error::RetrainError;
use crate::ledger::{LedgerRow, TrainingHistoryLedger};

pub const DEFAULT_TARGET_COLUMN: &str = "forecast";
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Smallest dataset that still leaves one row on each side of the split.
pub const MIN_ROWS: usize = 2;

/// Train, evaluate, and commit a new model.
///
/// The pipeline owns every write to the artifact, metrics snapshot, and
/// training history. Other components only read them.
#[derive(Debug, Clone)]
pub struct RetrainPipeline {
    data_path: PathBuf,
    model_path: PathBuf,
    metrics_path: PathBuf,
    history_path: PathBuf,
    target_column: String,
    test_fraction: f64,
}

impl RetrainPipeline {
    /// Pipeline writing `model_metrics.json` and `training_history.csv`
    /// beside `model_path`.
    pub fn new(data_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        let model_path = model_path.into();
        Self {
            data_path: data_path.into(),
            metrics_path: sibling(&model_path, "model_metrics.json"),
            history_path: sibling(&model_path, "training_history.csv"),
            model_path,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            test_fraction: DEFAULT_TEST_FRACTION,
        }
    }

    #[must_use]
    pub fn from_config(config: &LevyConfig) -> Self {
        Self::new(&config.paths.data_path, &config.paths.model_path)
            .with_metrics_path(config.paths.metrics_path())
            .with_history_path(config.paths.history_path())
            .with_target_column(&config.drift.target_column)
            .with_test_fraction(config.scheduler.test_fraction)
    }

    #[must_use]
    pub fn with_metrics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_path = path.into();
        self
    }

    #[must_use]
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    #[must_use]
    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    #[must_use]
    pub const fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    #[must_use]
    pub fn metrics_path(&self) -> &Path {
        &self.metrics_path
    }

    #[must_use]
    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    #[must_use]
    pub fn ledger(&self) -> TrainingHistoryLedger {
        TrainingHistoryLedger::new(&self.history_path)
    }

    /// Load the configured dataset and split it chronologically.
    ///
    /// The target column is separated from every other column; the trailing
    /// `test_fraction` of rows (rounded up) form the test set.
    ///
    /// # Errors
    ///
    /// Returns `RetrainError::Data` or `RetrainError::InsufficientRows`.
    pub fn load_data(&self) -> Result<TrainTestSplit, RetrainError> {
        self.load_data_from(&self.data_path)
    }

    fn load_data_from(&self, path: &Path) -> Result<TrainTestSplit, RetrainError> {
        let data_error = |source: CoreError| RetrainError::Data {
            path: path.to_path_buf(),
            source,
        };

        let data = Dataset::from_csv_path(path).map_err(data_error)?;
        if data.len() < MIN_ROWS {
            return Err(RetrainError::InsufficientRows {
                rows: data.len(),
                min: MIN_ROWS,
            });
        }
        let split = data
            .chronological_split(&self.target_column, self.test_fraction)
            .map_err(data_error)?;

        info!(
            path = %path.display(),
            train_rows = split.train_target.len(),
            test_rows = split.test_target.len(),
            "loaded training data"
        );
        Ok(split)
    }

    /// Fit a model of the given family.
    ///
    /// # Errors
    ///
    /// Returns `RetrainError::Model` if fitting fails.
    pub fn train_model(
        features: &FeatureMatrix,
        target: &[f64],
        kind: ModelKind,
    ) -> Result<RegressionModel, RetrainError> {
        Self::train_with_cancel(features, target, kind, &CancelFlag::new())
    }

    fn train_with_cancel(
        features: &FeatureMatrix,
        target: &[f64],
        kind: ModelKind,
        cancel: &CancelFlag,
    ) -> Result<RegressionModel, RetrainError> {
        Ok(RegressionModel::train(kind, features, target, cancel)?)
    }

    /// Error measures of `model` on the given rows.
    ///
    /// Callers pass the held-out test split. These numbers become the next
    /// drift baseline, and training-split error would understate it.
    #[must_use]
    pub fn evaluate_model(
        model: &impl Regressor,
        features: &FeatureMatrix,
        target: &[f64],
    ) -> EvaluationMetrics {
        let predicted = model.predict(features);
        let mse = stats::mean_squared_error(target, &predicted);
        EvaluationMetrics {
            mse,
            rmse: mse.sqrt(),
            mae: stats::mean_absolute_error(target, &predicted),
            r_squared: stats::r_squared(target, &predicted),
        }
    }

    /// Commit a trained model: artifact, then metrics snapshot, then one
    /// ledger row.
    ///
    /// Returns the ledger row as stored.
    ///
    /// # Errors
    ///
    /// Returns a persistence-class `RetrainError`. `LedgerAppend` means the
    /// artifact and snapshot were already replaced.
    pub fn save_model(
        &self,
        artifact: &ModelArtifact,
        metrics: &ModelMetrics,
    ) -> Result<LedgerRow, RetrainError> {
        artifact
            .save(&self.model_path)
            .map_err(RetrainError::ArtifactWrite)?;

        fs::write_json_atomic(&self.metrics_path, metrics).map_err(|source| {
            RetrainError::Persistence {
                what: "metrics snapshot",
                source,
            }
        })?;

        self.ledger()
            .append(LedgerRow::from(metrics))
            .map_err(|e| {
                error!(
                    path = %self.history_path.display(),
                    model_version = metrics.model_version,
                    %e,
                    "training history append failed after model commit"
                );
                RetrainError::LedgerAppend(e)
            })
    }

    /// Run the whole pipeline on `data_path` (or the configured dataset).
    ///
    /// # Errors
    ///
    /// Any failure before commit leaves persisted state untouched.
    pub fn run(
        &self,
        data_path: Option<&Path>,
        kind: ModelKind,
    ) -> Result<ModelMetrics, RetrainError> {
        self.run_with_cancel(data_path, kind, &CancelFlag::new())
    }

    /// [`Self::run`], abandoning the run if `cancel` is set before commit.
    ///
    /// # Errors
    ///
    /// Returns `RetrainError::Cancelled` if cancelled, otherwise as `run`.
    pub fn run_with_cancel(
        &self,
        data_path: Option<&Path>,
        kind: ModelKind,
        cancel: &CancelFlag,
    ) -> Result<ModelMetrics, RetrainError> {
        let path = data_path.unwrap_or(&self.data_path);
        info!(path = %path.display(), model_type = %kind, "starting model retraining");

        let split = self.load_data_from(path)?;
        let model =
            Self::train_with_cancel(&split.train_features, &split.train_target, kind, cancel)?;
        let eval = Self::evaluate_model(&model, &split.test_features, &split.test_target);

        // Stamp the snapshot and artifact with the time the ledger will store.
        let (model_version, timestamp) = self
            .ledger()
            .next_entry(Utc::now())
            .map_err(|source| RetrainError::Persistence {
                what: "training history",
                source,
            })?;

        let metrics = ModelMetrics {
            mse: eval.mse,
            rmse: eval.rmse,
            mae: eval.mae,
            r_squared: eval.r_squared,
            model_version,
            model_type: kind,
            timestamp,
            baseline_mean: Some(stats::mean(&split.train_target)),
            train_rows: split.train_target.len(),
            test_rows: split.test_target.len(),
        };
        let artifact = ModelArtifact {
            model_version,
            trained_at: timestamp,
            feature_names: split.train_features.names().to_vec(),
            target_column: self.target_column.clone(),
            model,
        };

        if cancel.is_cancelled() {
            info!(model_version, "retrain cancelled before commit");
            return Err(RetrainError::Cancelled);
        }

        self.save_model(&artifact, &metrics)?;
        info!(
            model_version,
            mse = metrics.mse,
            mae = metrics.mae,
            r2 = metrics.r_squared,
            "retraining complete"
        );
        Ok(metrics)
    }

    /// Every committed run, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RetrainError::Persistence` if the ledger cannot be read.
    pub fn history(&self) -> Result<Vec<LedgerRow>, RetrainError> {
        self.ledger()
            .rows()
            .map_err(|source| RetrainError::Persistence {
                what: "training history",
                source,
            })
    }
}
