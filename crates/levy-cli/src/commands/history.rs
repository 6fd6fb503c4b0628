use levy_config::LevyConfig;
use levy_retrain::RetrainPipeline;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::{output, to_ndjson};

/// Handle `levyml history`.
pub fn handle(config: &LevyConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rows = RetrainPipeline::from_config(config).history()?;
    match flags.format {
        OutputFormat::Raw => {
            print!("{}", to_ndjson(&rows)?);
            Ok(())
        }
        OutputFormat::Json => output(&rows, flags.format),
    }
}
