//! The closed set of regression model families.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Regression family trained by the retrain pipeline.
///
/// Resolved once from configuration or CLI input; downstream code matches on
/// the variant instead of comparing strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Ordinary least squares with intercept.
    #[default]
    Linear,
    /// Bagged regression trees with fixed hyperparameters.
    Forest,
}

impl ModelKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Forest => "forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "forest" | "random_forest" => Ok(Self::Forest),
            other => Err(CoreError::Validation(format!(
                "unknown model type '{other}' (expected 'linear' or 'forest')"
            ))),
        }
    }
}
