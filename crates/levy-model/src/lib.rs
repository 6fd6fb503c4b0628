//! # levy-model
//!
//! Regression models predicting the fiscal impact of a proposed levy, and the
//! serialized [`artifact::ModelArtifact`] the rest of the system reads.
//!
//! Two families are available, selected by [`ModelKind`]:
//! - [`linear::LinearRegression`]: ordinary least squares with intercept
//! - [`forest::RandomForest`]: 100 bagged regression trees, seed 42

pub mod artifact;
pub mod error;
pub mod forest;
pub mod linear;

pub use artifact::ModelArtifact;
pub use error::ModelError;

use levy_core::cancel::CancelFlag;
use levy_core::dataset::FeatureMatrix;
use levy_core::model_kind::ModelKind;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::forest::{ForestParams, RandomForest};
use crate::linear::LinearRegression;

/// Anything that maps one feature row to a prediction.
pub trait Regressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64;

    /// Predict every row. Columns must already be in training order.
    fn predict(&self, x: &FeatureMatrix) -> Vec<f64> {
        x.values().outer_iter().map(|r| self.predict_row(r)).collect()
    }
}

/// A fitted model of either family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear(LinearRegression),
    Forest(RandomForest),
}

impl RegressionModel {
    /// Fit a model of the given family.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for invalid input or cancellation.
    pub fn train(
        kind: ModelKind,
        x: &FeatureMatrix,
        y: &[f64],
        cancel: &CancelFlag,
    ) -> Result<Self, ModelError> {
        tracing::info!(model_type = %kind, rows = x.nrows(), features = x.ncols(), "training model");
        match kind {
            ModelKind::Linear => LinearRegression::fit(x, y).map(Self::Linear),
            ModelKind::Forest => {
                RandomForest::fit(x, y, ForestParams::default(), cancel).map(Self::Forest)
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Linear(_) => ModelKind::Linear,
            Self::Forest(_) => ModelKind::Forest,
        }
    }
}

impl Regressor for RegressionModel {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self {
            Self::Linear(m) => m.predict_row(row),
            Self::Forest(m) => m.predict_row(row),
        }
    }
}
