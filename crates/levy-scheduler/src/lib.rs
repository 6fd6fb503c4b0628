//! # levy-scheduler
//!
//! Runs drift checks on a fixed interval and retrains the model when drift
//! is detected. Each cycle is appended to the drift check log, and operators
//! are notified of every detection and of every retrain outcome.
//!
//! The loop runs on one spawned tokio task. Checks and retrains run on the
//! blocking pool, one after the other. Shared state lives on disk: the
//! pipeline replaces files atomically and every other reader does
//! whole-file reads.

pub mod drift_log;
pub mod error;
pub mod notify;
pub mod scheduler;
pub mod signal;

pub use drift_log::DriftCheckLog;
pub use error::SchedulerError;
pub use notify::{LogFileNotifier, Notifier};
pub use scheduler::{RetrainingScheduler, SchedulerState};
pub use signal::wait_for_shutdown_signal;

use levy_core::drift::MonitorOutcome;
use levy_core::model_kind::ModelKind;
use levy_retrain::RetrainPipeline;
use tracing::{error, info};

/// Run `pipeline` if `outcome` reports drift.
///
/// Returns `true` only when a retrain ran and committed. Failures are
/// logged, not returned.
pub fn trigger_retraining(outcome: &MonitorOutcome, pipeline: &RetrainPipeline, kind: ModelKind) -> bool {
    if !outcome.drift_detected() {
        info!("no drift detected, retraining not needed");
        return false;
    }

    info!("drift detected, triggering retraining");
    match pipeline.run(None, kind) {
        Ok(metrics) => {
            info!(mse = metrics.mse, model_version = metrics.model_version, "retraining completed");
            true
        }
        Err(e) => {
            error!(%e, "error triggering retraining");
            false
        }
    }
}
