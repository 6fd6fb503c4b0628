use std::path::PathBuf;

use clap::{Args, Subcommand};
use levy_core::model_kind::ModelKind;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run one drift check and print the result.
    Check(CheckArgs),
    /// Run the retraining scheduler.
    Schedule(ScheduleArgs),
    /// Retrain the model now, irrespective of drift.
    Retrain(RetrainArgs),
    /// Show the training history ledger.
    History,
    /// Write a copy of a dataset with one column shifted.
    SimulateDrift(SimulateDriftArgs),
}

#[derive(Clone, Debug, Args)]
pub struct CheckArgs {
    /// Retrain if drift is detected.
    #[arg(long)]
    pub trigger_retraining: bool,

    /// Baseline mean for the scalar value check.
    #[arg(long)]
    pub baseline_mean: Option<f64>,

    /// Absolute threshold for the scalar value check.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Also compare this single value against the baseline mean.
    #[arg(long)]
    pub value: Option<f64>,

    /// Model family used when retraining (linear, forest).
    #[arg(long)]
    pub model_type: Option<ModelKind>,
}

#[derive(Clone, Debug, Args)]
pub struct ScheduleArgs {
    /// Hours between drift checks.
    #[arg(long)]
    pub interval_hours: Option<f64>,

    /// Run a single check and exit.
    #[arg(long)]
    pub run_once: bool,

    /// Stop after this many minutes (0 = until interrupted).
    #[arg(long, default_value_t = 0)]
    pub runtime_minutes: u64,

    /// Model family used when retraining (linear, forest).
    #[arg(long)]
    pub model_type: Option<ModelKind>,
}

#[derive(Clone, Debug, Args)]
pub struct RetrainArgs {
    /// Model family (linear, forest).
    #[arg(long)]
    pub model_type: Option<ModelKind>,

    /// Train on this dataset instead of the configured one.
    #[arg(long)]
    pub data: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct SimulateDriftArgs {
    /// Output CSV path.
    pub output: PathBuf,

    /// Source dataset (defaults to the configured data path).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Column to shift.
    #[arg(long, default_value = "forecast")]
    pub column: String,

    /// Constant added to every value of the column.
    #[arg(long, default_value_t = 8.5, allow_negative_numbers = true)]
    pub offset: f64,
}
