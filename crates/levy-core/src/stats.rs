//! Descriptive statistics and regression error measures.
//!
//! Empty inputs yield `0.0` rather than `NaN` so that results stay
//! JSON-serializable.

/// Arithmetic mean.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Fewer than two values
/// yield `0.0`.
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Mean squared error between observed and predicted values.
#[must_use]
pub fn mean_squared_error(observed: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(observed.len(), predicted.len());
    if observed.is_empty() {
        return 0.0;
    }
    observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / observed.len() as f64
}

/// Mean absolute error between observed and predicted values.
#[must_use]
pub fn mean_absolute_error(observed: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(observed.len(), predicted.len());
    if observed.is_empty() {
        return 0.0;
    }
    observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).abs())
        .sum::<f64>()
        / observed.len() as f64
}

/// Coefficient of determination.
///
/// A constant target has no variance to explain: a perfect fit scores `1.0`
/// and anything else `0.0`.
#[must_use]
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let m = mean(observed);
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let ss_tot: f64 = observed.iter().map(|y| (y - m).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Relative change of `current` against `reference`: `(current - reference) / reference`.
///
/// A zero reference is replaced by `f64::EPSILON` so the result stays finite.
#[must_use]
pub fn relative_change(current: f64, reference: f64) -> f64 {
    let denom = if reference.abs() < f64::EPSILON {
        f64::EPSILON.copysign(reference)
    } else {
        reference
    };
    (current - reference) / denom
}
