//! The retraining scheduler.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use levy_config::LevyConfig;
use levy_core::cancel::CancelFlag;
use levy_core::drift::{DriftCheckRecord, MonitorOutcome};
use levy_core::metrics::ModelMetrics;
use levy_drift::DriftDetector;
use levy_retrain::{RetrainError, RetrainPipeline};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::drift_log::DriftCheckLog;
use crate::error::SchedulerError;
use crate::notify::{LogFileNotifier, Notifier};

/// Process-local view of the scheduler. Reset on restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    pub running: bool,
    pub last_check_time: Option<DateTime<Utc>>,
    pub next_check_time: Option<DateTime<Utc>>,
    pub check_interval: Duration,
}

struct Inner {
    config: LevyConfig,
    pipeline: RetrainPipeline,
    notifier: Arc<dyn Notifier>,
    drift_log: DriftCheckLog,
    state: Mutex<SchedulerState>,
    shutdown: watch::Sender<bool>,
    active_retrain: Mutex<Option<CancelFlag>>,
}

/// Periodic drift checks with retraining on detected drift.
///
/// Stopped until [`Self::start`]. While running, one background task repeats
/// check, optional retrain, and sleep. [`Self::stop`] takes effect within one
/// poll slice (at most 10 seconds), however long the interval is.
pub struct RetrainingScheduler {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RetrainingScheduler {
    #[must_use]
    pub fn new(config: LevyConfig, notifier: Arc<dyn Notifier>) -> Self {
        let (shutdown, _) = watch::channel(false);
        let state = SchedulerState {
            running: false,
            last_check_time: None,
            next_check_time: None,
            check_interval: config.scheduler.check_interval(),
        };
        Self {
            inner: Arc::new(Inner {
                pipeline: RetrainPipeline::from_config(&config),
                drift_log: DriftCheckLog::new(config.paths.drift_log_path()),
                notifier,
                config,
                state: Mutex::new(state),
                shutdown,
                active_retrain: Mutex::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// Scheduler notifying through `notifications.log` in the log directory.
    #[must_use]
    pub fn with_log_notifier(config: LevyConfig) -> Self {
        let notifier = Arc::new(LogFileNotifier::new(config.paths.notifications_path()));
        Self::new(config, notifier)
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        lock(&self.inner.state).clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.inner.state).running
    }

    #[must_use]
    pub fn drift_log(&self) -> &DriftCheckLog {
        &self.inner.drift_log
    }

    /// Spawn the check loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::AlreadyRunning` if the loop is active.
    pub fn start(&self) -> Result<(), SchedulerError> {
        {
            let mut state = lock(&self.inner.state);
            if state.running {
                warn!("scheduler is already running");
                return Err(SchedulerError::AlreadyRunning);
            }
            state.running = true;
        }

        info!(
            interval_hours = self.inner.config.scheduler.check_interval_hours,
            "starting retraining scheduler"
        );
        self.inner.shutdown.send_replace(false);
        let receiver = self.inner.shutdown.subscribe();
        let handle = tokio::spawn(run_loop(Arc::clone(&self.inner), receiver));
        *lock(&self.task) = Some(handle);
        Ok(())
    }

    /// Set the shutdown flag and cancel any in-flight retrain. Never blocks.
    ///
    /// Drift found by a check already under way is still logged and
    /// notified, but no retrain is started for it.
    pub fn request_stop(&self) {
        self.inner.request_stop();
    }

    /// Request shutdown and wait for the loop task to exit.
    pub async fn stop(&self) {
        if !self.is_running() {
            warn!("scheduler is not running");
        }
        info!("stopping retraining scheduler");
        self.inner.request_stop();

        let handle = lock(&self.task).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(%e, "scheduler task ended abnormally");
            }
        }
        lock(&self.inner.state).running = false;
    }

    /// One check (and retrain on drift) without entering the loop.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError` if the check task fails or the drift check
    /// log cannot be written.
    pub async fn run_once(&self) -> Result<DriftCheckRecord, SchedulerError> {
        self.check_for_drift().await
    }

    /// Run a drift check, retrain if it reports drift, notify, and append
    /// the outcome to the drift check log.
    ///
    /// A check that fails (missing model, unreadable data) is logged as an
    /// error record and treated as no drift.
    ///
    /// # Errors
    ///
    /// See [`Self::run_once`].
    pub async fn check_for_drift(&self) -> Result<DriftCheckRecord, SchedulerError> {
        self.inner.check_for_drift().await
    }
}

impl Inner {
    fn request_stop(&self) {
        self.shutdown.send_replace(true);
        if let Some(cancel) = lock(&self.active_retrain).as_ref() {
            cancel.cancel();
        }
    }

    async fn check_for_drift(&self) -> Result<DriftCheckRecord, SchedulerError> {
        info!("checking for model drift");
        let config = self.config.clone();
        let interval = chrono::Duration::from_std(self.config.scheduler.check_interval())
            .unwrap_or_else(|_| chrono::Duration::days(36_500));

        let check = tokio::task::spawn_blocking(move || {
            DriftDetector::from_config(&config).monitor_and_alert(
                &config.paths.data_path,
                None,
                interval,
            )
        })
        .await?;

        let mut retraining_triggered = false;
        let mut retraining_success = None;
        let mut retraining_error = None;
        let mut retrain_metrics = None;

        if check.drift_detected() {
            let details = serde_json::to_string_pretty(&check).unwrap_or_default();
            if self.is_stopping() {
                warn!("drift detected during shutdown, retraining skipped");
                self.send(
                    "Model Drift Detected",
                    &format!(
                        "Drift detected in levy impact prediction model. Retraining skipped because the scheduler is stopping.\nDrift details: {details}"
                    ),
                );
                retraining_error = Some(SchedulerError::ShuttingDown.to_string());
            } else {
                warn!("drift detected, triggering retraining");
                self.send(
                    "Model Drift Detected",
                    &format!(
                        "Drift detected in levy impact prediction model. Retraining initiated.\nDrift details: {details}"
                    ),
                );

                retraining_triggered = true;
                match self.retrain().await {
                    Ok(metrics) => {
                        info!(model_version = metrics.model_version, "retraining completed successfully");
                        self.send(
                            "Model Retraining Complete",
                            &format!(
                                "Levy impact prediction model has been successfully retrained (version {}, MSE {:.4}, R2 {:.4}).",
                                metrics.model_version, metrics.mse, metrics.r_squared
                            ),
                        );
                        retraining_success = Some(true);
                        retrain_metrics = Some(metrics);
                    }
                    Err(e) => {
                        error!(%e, "retraining failed");
                        self.send(
                            "Model Retraining Failed",
                            &format!("Attempt to retrain levy impact prediction model failed: {e}"),
                        );
                        retraining_success = Some(false);
                        retraining_error = Some(e.to_string());
                    }
                }
            }
        } else if let MonitorOutcome::Error(failure) = &check {
            warn!(message = %failure.message, "drift check failed, treating as no drift");
        } else {
            info!("no drift detected, model is performing well");
        }

        let last_check_time = Utc::now();
        let next_check_time = last_check_time
            .checked_add_signed(interval)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        {
            let mut state = lock(&self.state);
            state.last_check_time = Some(last_check_time);
            state.next_check_time = Some(next_check_time);
        }

        let record = DriftCheckRecord {
            check,
            retraining_triggered,
            retraining_success,
            retraining_error,
            retrain_metrics,
            last_check_time,
            next_check_time,
        };
        self.drift_log.append(&record)?;
        Ok(record)
    }

    fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run the pipeline on the blocking pool, bounded by the configured
    /// timeout. On expiry the run's flag is set and the task is awaited, so
    /// the result reflects what was actually committed.
    async fn retrain(&self) -> Result<ModelMetrics, SchedulerError> {
        let cancel = CancelFlag::new();
        *lock(&self.active_retrain) = Some(cancel.clone());
        // A stop that raced the flag install only set the shutdown flag.
        if self.is_stopping() {
            *lock(&self.active_retrain) = None;
            return Err(SchedulerError::ShuttingDown);
        }

        let pipeline = self.pipeline.clone();
        let kind = self.config.scheduler.model_type;
        let flag = cancel.clone();
        let mut task =
            tokio::task::spawn_blocking(move || pipeline.run_with_cancel(None, kind, &flag));

        let result = match self.config.scheduler.retrain_timeout() {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => flatten(joined),
                Err(_) => {
                    let minutes = self.config.scheduler.retrain_timeout_minutes;
                    warn!(minutes, "retraining exceeded its time limit, cancelling");
                    cancel.cancel();
                    match flatten(task.await) {
                        Err(SchedulerError::Retrain(RetrainError::Cancelled)) => {
                            Err(SchedulerError::RetrainTimeout { minutes })
                        }
                        Ok(metrics) => {
                            warn!(
                                model_version = metrics.model_version,
                                "retraining committed before cancellation took effect"
                            );
                            Ok(metrics)
                        }
                        other => other,
                    }
                }
            },
            None => flatten(task.await),
        };

        *lock(&self.active_retrain) = None;
        result
    }

    fn send(&self, subject: &str, message: &str) {
        if let Err(e) = self.notifier.notify(subject, message) {
            error!(subject, %e, "failed to send notification");
        }
    }
}

fn flatten<T, E>(joined: Result<Result<T, E>, tokio::task::JoinError>) -> Result<T, SchedulerError>
where
    SchedulerError: From<E>,
{
    Ok(joined??)
}

async fn run_loop(inner: Arc<Inner>, mut shutdown: watch::Receiver<bool>) {
    let interval = inner.config.scheduler.check_interval();
    let slice = inner.config.scheduler.poll_slice();
    info!(interval_secs = interval.as_secs(), "scheduler loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let wait = match inner.check_for_drift().await {
            Ok(record) => {
                info!(next_check = %record.next_check_time, "next check scheduled");
                interval
            }
            Err(e) => {
                error!(%e, "error in scheduler loop");
                inner.config.scheduler.error_backoff()
            }
        };

        if sleep_in_slices(&mut shutdown, wait, slice).await {
            break;
        }
    }

    lock(&inner.state).running = false;
    info!("scheduler loop stopped");
}

/// Sleep for `total` in steps of at most `slice`, re-checking the shutdown
/// flag between steps. Returns `true` if shutdown was requested.
async fn sleep_in_slices(
    shutdown: &mut watch::Receiver<bool>,
    total: Duration,
    slice: Duration,
) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if *shutdown.borrow_and_update() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        let step = slice.min(deadline - now);
        tokio::select! {
            () = tokio::time::sleep(step) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    return true;
                }
            }
        }
    }
}
