//! # levy-config
//!
//! Layered configuration loading for levy model monitoring using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LEVYWATCH_*` prefix, `__` as separator)
//! 2. An explicit config file passed by the caller
//! 3. Project-level `.levywatch/config.toml`
//! 4. User-level `~/.config/levywatch/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! `LEVYWATCH_DRIFT__THRESHOLD` -> `drift.threshold`,
//! `LEVYWATCH_SCHEDULER__CHECK_INTERVAL_HOURS` -> `scheduler.check_interval_hours`,
//! `LEVYWATCH_PATHS__MODEL_PATH` -> `paths.model_path`.
//!
//! # Usage
//!
//! ```no_run
//! use levy_config::LevyConfig;
//!
//! let config = LevyConfig::load().expect("config");
//! println!("checking every {}h", config.scheduler.check_interval_hours);
//! ```

mod drift;
mod error;
mod paths;
mod scheduler;

pub use drift::DriftConfig;
pub use error::ConfigError;
pub use paths::{PathsConfig, sibling};
pub use scheduler::{
    MAX_CHECK_INTERVAL_HOURS, MAX_POLL_SLICE_SECS, MAX_RETRAIN_TIMEOUT_MINUTES, SchedulerConfig,
};

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LevyConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl LevyConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does not read `.env`; the binary loads it before calling this.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_file` above the discovered TOML files.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_with(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the default figment provider chain.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_with(None)
    }

    fn figment_with(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".levywatch/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("LEVYWATCH_").split("__"))
    }

    /// Reject values the monitoring loop cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: String| {
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason,
            })
        };

        let hours = self.scheduler.check_interval_hours;
        if !(hours > 0.0 && hours <= MAX_CHECK_INTERVAL_HOURS) {
            return invalid(
                "scheduler.check_interval_hours",
                format!("must be in (0, {MAX_CHECK_INTERVAL_HOURS}], got {hours}"),
            );
        }
        let timeout = self.scheduler.retrain_timeout_minutes;
        if !(timeout >= 0.0 && timeout <= MAX_RETRAIN_TIMEOUT_MINUTES) {
            return invalid(
                "scheduler.retrain_timeout_minutes",
                format!("must be in [0, {MAX_RETRAIN_TIMEOUT_MINUTES}], got {timeout}"),
            );
        }
        if !(self.scheduler.test_fraction > 0.0 && self.scheduler.test_fraction < 1.0) {
            return invalid(
                "scheduler.test_fraction",
                format!("must be in (0, 1), got {}", self.scheduler.test_fraction),
            );
        }
        if self.drift.threshold < 0.0 || self.drift.threshold.is_nan() {
            return invalid(
                "drift.threshold",
                format!("must be non-negative, got {}", self.drift.threshold),
            );
        }
        if self.drift.target_column.trim().is_empty() {
            return invalid("drift.target_column", "must not be empty".to_string());
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("levywatch").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LevyConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.paths.model_path, PathBuf::from("ml/models/levy_impact_model.json"));
        assert_eq!(config.drift.target_column, "forecast");
    }

    #[test]
    fn figment_builds_without_files() {
        let figment = LevyConfig::figment();
        let config: LevyConfig = figment.extract().expect("should extract defaults");
        assert_eq!(config.drift.window_size, 30);
        assert!((config.scheduler.check_interval_hours - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_positive_interval() {
        let mut config = LevyConfig::default();
        config.scheduler.check_interval_hours = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "scheduler.check_interval_hours"
        ));
    }

    #[test]
    fn rejects_negative_retrain_timeout() {
        let mut config = LevyConfig::default();
        config.scheduler.retrain_timeout_minutes = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "scheduler.retrain_timeout_minutes"
        ));
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut config = LevyConfig::default();
        config.drift.threshold = -1.0;
        assert!(config.validate().is_err());
    }
}
