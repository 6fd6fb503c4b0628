//! # levy-drift
//!
//! Decides whether the current levy impact model still fits current data.
//!
//! Three independent checks, combined by [`DriftDetector::monitor_and_alert`]:
//! - scalar value drift against a baseline mean
//! - feature distribution drift (z-score of the mean shift)
//! - prediction-error drift (relative MSE/MAE increase over the last
//!   training run's held-out metrics)

pub mod detector;
pub mod error;

pub use detector::DriftDetector;
pub use error::DriftError;

/// Default spacing between monitoring passes when run standalone.
#[must_use]
pub fn default_check_interval() -> chrono::Duration {
    chrono::Duration::days(7)
}
