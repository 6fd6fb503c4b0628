//! Locations of the dataset, model artifact, and logs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_data_path() -> PathBuf {
    PathBuf::from("data/levy_training_data.csv")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("ml/models/levy_impact_model.json")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Training dataset (CSV) checked for drift and used for retraining.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Canonical reference dataset for distribution drift.
    #[serde(default = "default_data_path")]
    pub reference_data_path: PathBuf,

    /// Current model artifact.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Metrics snapshot. Defaults to `model_metrics.json` beside the model.
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,

    /// Training history ledger. Defaults to `training_history.csv` beside the model.
    #[serde(default)]
    pub history_path: Option<PathBuf>,

    /// Directory for `drift_checks.json` and `notifications.log`.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            reference_data_path: default_data_path(),
            model_path: default_model_path(),
            metrics_path: None,
            history_path: None,
            log_dir: default_log_dir(),
        }
    }
}

impl PathsConfig {
    #[must_use]
    pub fn metrics_path(&self) -> PathBuf {
        self.metrics_path
            .clone()
            .unwrap_or_else(|| sibling(&self.model_path, "model_metrics.json"))
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| sibling(&self.model_path, "training_history.csv"))
    }

    #[must_use]
    pub fn drift_log_path(&self) -> PathBuf {
        self.log_dir.join("drift_checks.json")
    }

    #[must_use]
    pub fn notifications_path(&self) -> PathBuf {
        self.log_dir.join("notifications.log")
    }
}

/// `file_name` in the same directory as `path`.
#[must_use]
pub fn sibling(path: &Path, file_name: &str) -> PathBuf {
    path.parent()
        .map_or_else(|| PathBuf::from(file_name), |dir| dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_follow_model_dir() {
        let paths = PathsConfig {
            model_path: PathBuf::from("/srv/models/m.json"),
            ..PathsConfig::default()
        };
        assert_eq!(paths.metrics_path(), PathBuf::from("/srv/models/model_metrics.json"));
        assert_eq!(paths.history_path(), PathBuf::from("/srv/models/training_history.csv"));
    }

    #[test]
    fn explicit_metrics_path_wins() {
        let paths = PathsConfig {
            metrics_path: Some(PathBuf::from("elsewhere.json")),
            ..PathsConfig::default()
        };
        assert_eq!(paths.metrics_path(), PathBuf::from("elsewhere.json"));
    }

    #[test]
    fn log_files_live_in_log_dir() {
        let paths = PathsConfig::default();
        assert_eq!(paths.drift_log_path(), PathBuf::from("logs/drift_checks.json"));
        assert_eq!(paths.notifications_path(), PathBuf::from("logs/notifications.log"));
    }
}
