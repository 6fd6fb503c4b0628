use anyhow::Context;
use levy_config::LevyConfig;
use levy_retrain::RetrainPipeline;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RetrainArgs;
use crate::output::output;

/// Handle `levyml retrain`.
pub fn handle(args: &RetrainArgs, config: &LevyConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let kind = args.model_type.unwrap_or(config.scheduler.model_type);
    let pipeline = RetrainPipeline::from_config(config);
    let metrics = pipeline
        .run(args.data.as_deref(), kind)
        .context("retraining failed")?;
    output(&metrics, flags.format)
}
