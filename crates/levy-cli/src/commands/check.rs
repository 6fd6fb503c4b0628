use anyhow::bail;
use levy_config::LevyConfig;
use levy_core::drift::{MonitorOutcome, ValueDrift};
use levy_drift::DriftDetector;
use levy_retrain::RetrainPipeline;
use levy_scheduler::trigger_retraining;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CheckArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct CheckReport {
    check: MonitorOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_drift: Option<ValueDrift>,
    retraining_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    retraining_success: Option<bool>,
}

/// Handle `levyml check`.
///
/// Exits non-zero when the check itself failed. Detected drift is a
/// successful check.
pub fn handle(args: &CheckArgs, mut config: LevyConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    if let Some(mean) = args.baseline_mean {
        config.drift.baseline_mean = Some(mean);
    }
    if let Some(threshold) = args.threshold {
        config.drift.threshold = threshold;
    }
    config.validate()?;

    let detector = DriftDetector::from_config(&config);
    let interval = chrono::Duration::from_std(config.scheduler.check_interval())?;
    let outcome = detector.monitor_and_alert(&config.paths.data_path, None, interval);
    let value_drift = args.value.map(|v| detector.check_value_drift(v));

    let mut retraining_triggered = false;
    let mut retraining_success = None;
    if args.trigger_retraining && outcome.drift_detected() {
        let kind = args.model_type.unwrap_or(config.scheduler.model_type);
        let pipeline = RetrainPipeline::from_config(&config);
        retraining_triggered = true;
        retraining_success = Some(trigger_retraining(&outcome, &pipeline, kind));
    }

    let failed = outcome.is_error();
    output(
        &CheckReport {
            check: outcome,
            value_drift,
            retraining_triggered,
            retraining_success,
        },
        flags.format,
    )?;

    if failed {
        bail!("drift check failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn flags() -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Raw,
            quiet: true,
            verbose: false,
            config: None,
            data_path: None,
            model_path: None,
            metrics_path: None,
            log_dir: None,
        }
    }

    fn args() -> CheckArgs {
        CheckArgs {
            trigger_retraining: true,
            baseline_mean: None,
            threshold: None,
            value: None,
            model_type: None,
        }
    }

    #[test]
    fn failed_check_is_an_error_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LevyConfig::default();
        config.paths.data_path = dir.path().join("missing.csv");
        config.paths.model_path = dir.path().join("missing.json");

        let err = handle(&args(), config, &flags()).unwrap_err();
        assert!(err.to_string().contains("drift check failed"));
    }

    #[test]
    fn negative_threshold_override_is_rejected() {
        let args = CheckArgs {
            threshold: Some(-1.0),
            ..args()
        };
        assert!(handle(&args, LevyConfig::default(), &flags()).is_err());
    }
}
