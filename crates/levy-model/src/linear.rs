//! Ordinary least squares with intercept.
//!
//! Fitted on mean-centered data through the normal equations. Columns that
//! are constant or collinear with earlier ones receive a zero coefficient.

use levy_core::dataset::FeatureMatrix;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::Regressor;
use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegression {
    /// Fit coefficients minimizing squared error.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidInput` for empty input or a row count
    /// mismatch between `x` and `y`.
    pub fn fit(x: &FeatureMatrix, y: &[f64]) -> Result<Self, ModelError> {
        if x.nrows() == 0 {
            return Err(ModelError::InvalidInput("no training rows".into()));
        }
        if x.nrows() != y.len() {
            return Err(ModelError::InvalidInput(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            )));
        }

        let y = ArrayView1::from(y);
        let y_mean = y.mean().unwrap_or(0.0);
        let x_means = x
            .values()
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));

        // Normal equations on centered data: (Xc^T Xc) w = Xc^T yc
        let xc = x.values() - &x_means;
        let yc = &y - y_mean;
        let gram = xc.t().dot(&xc);
        let rhs = xc.t().dot(&yc);

        let coefficients = solve_least_squares(gram, rhs);
        let intercept = y_mean - coefficients.dot(&x_means);

        Ok(Self {
            intercept,
            coefficients: coefficients.to_vec(),
        })
    }
}

impl Regressor for LinearRegression {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }
}

/// Gaussian elimination with partial pivoting on a symmetric PSD system.
/// Variables whose pivot vanishes are fixed at zero.
fn solve_least_squares(mut a: Array2<f64>, mut b: Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let scale = a.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tol = 1e-12 * (1.0 + scale);

    for k in 0..n {
        let pivot_row = (k..n)
            .max_by(|&i, &j| a[[i, k]].abs().total_cmp(&a[[j, k]].abs()))
            .unwrap_or(k);

        if a[[pivot_row, k]].abs() <= tol {
            a.column_mut(k).fill(0.0);
            a.row_mut(k).fill(0.0);
            a[[k, k]] = 1.0;
            b[k] = 0.0;
            continue;
        }

        if pivot_row != k {
            for j in 0..n {
                a.swap([k, j], [pivot_row, j]);
            }
            b.swap(k, pivot_row);
        }

        for i in (k + 1)..n {
            let factor = a[[i, k]] / a[[k, k]];
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                a[[i, j]] -= factor * a[[k, j]];
            }
            b[i] -= factor * b[k];
        }
    }

    let mut w = Array1::zeros(n);
    for k in (0..n).rev() {
        let tail: f64 = ((k + 1)..n).map(|j| a[[k, j]] * w[j]).sum();
        w[k] = (b[k] - tail) / a[[k, k]];
    }
    w
}
