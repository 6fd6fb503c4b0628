//! Retraining scheduler settings.

use std::time::Duration;

use levy_core::model_kind::ModelKind;
use serde::{Deserialize, Serialize};

const fn default_check_interval_hours() -> f64 {
    24.0
}

const fn default_poll_slice_secs() -> u64 {
    10
}

const fn default_error_backoff_secs() -> u64 {
    60
}

const fn default_retrain_timeout_minutes() -> f64 {
    120.0
}

const fn default_test_fraction() -> f64 {
    0.2
}

/// Longest sleep slice between cancellation checks.
pub const MAX_POLL_SLICE_SECS: u64 = 10;

/// One hundred years.
pub const MAX_CHECK_INTERVAL_HOURS: f64 = 876_000.0;

/// Thirty days.
pub const MAX_RETRAIN_TIMEOUT_MINUTES: f64 = 43_200.0;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Hours between drift checks.
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: f64,

    /// Sleep slice between cancellation checks (clamped to 10 seconds).
    #[serde(default = "default_poll_slice_secs")]
    pub poll_slice_secs: u64,

    /// Pause after a failed iteration before the loop continues.
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,

    /// Upper bound on one retrain run; `0` disables the bound. Fractions
    /// of a minute are allowed.
    #[serde(default = "default_retrain_timeout_minutes")]
    pub retrain_timeout_minutes: f64,

    /// Model family trained when drift triggers a retrain.
    #[serde(default)]
    pub model_type: ModelKind,

    /// Trailing share of rows held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_hours: default_check_interval_hours(),
            poll_slice_secs: default_poll_slice_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            retrain_timeout_minutes: default_retrain_timeout_minutes(),
            model_type: ModelKind::default(),
            test_fraction: default_test_fraction(),
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs_f64(self.check_interval_hours.max(0.0) * 3600.0)
    }

    #[must_use]
    pub fn poll_slice(&self) -> Duration {
        Duration::from_secs(self.poll_slice_secs.clamp(1, MAX_POLL_SLICE_SECS))
    }

    #[must_use]
    pub const fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    #[must_use]
    pub fn retrain_timeout(&self) -> Option<Duration> {
        let minutes = self.retrain_timeout_minutes.min(MAX_RETRAIN_TIMEOUT_MINUTES);
        (minutes > 0.0).then(|| Duration::from_secs_f64(minutes * 60.0))
    }
}
