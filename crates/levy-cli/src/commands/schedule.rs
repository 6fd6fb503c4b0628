use std::time::Duration;

use levy_config::LevyConfig;
use levy_scheduler::{RetrainingScheduler, wait_for_shutdown_signal};
use tracing::info;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ScheduleArgs;
use crate::output::output;

/// Handle `levyml schedule`.
pub async fn handle(
    args: &ScheduleArgs,
    mut config: LevyConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    if let Some(hours) = args.interval_hours {
        config.scheduler.check_interval_hours = hours;
    }
    if let Some(kind) = args.model_type {
        config.scheduler.model_type = kind;
    }
    config.validate()?;

    let scheduler = RetrainingScheduler::with_log_notifier(config);

    if args.run_once {
        let record = scheduler.run_once().await?;
        return output(&record, flags.format);
    }

    scheduler.start()?;
    let runtime = args.runtime_minutes;
    let deadline = async {
        if runtime == 0 {
            info!("scheduler running until interrupted");
            std::future::pending::<()>().await;
        } else {
            info!(minutes = runtime, "scheduler running for a fixed time");
            tokio::time::sleep(Duration::from_secs(runtime.saturating_mul(60))).await;
        }
    };

    tokio::select! {
        () = wait_for_shutdown_signal() => scheduler.request_stop(),
        () = deadline => {}
    }

    scheduler.stop().await;
    output(&scheduler.state(), flags.format)
}
