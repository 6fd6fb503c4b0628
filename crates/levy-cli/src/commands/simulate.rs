use std::path::{Path, PathBuf};

use anyhow::Context;
use levy_config::LevyConfig;
use levy_core::dataset::Dataset;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SimulateDriftArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SimulationReport {
    input: PathBuf,
    output: PathBuf,
    column: String,
    offset: f64,
    rows: usize,
}

/// Handle `levyml simulate-drift`.
pub fn handle(
    args: &SimulateDriftArgs,
    config: &LevyConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let input = args.input.as_deref().unwrap_or(&config.paths.data_path);
    let rows = write_shifted(input, &args.output, &args.column, args.offset)?;
    tracing::info!(output = %args.output.display(), column = %args.column, offset = args.offset, "wrote drifted dataset");

    output(
        &SimulationReport {
            input: input.to_path_buf(),
            output: args.output.clone(),
            column: args.column.clone(),
            offset: args.offset,
            rows,
        },
        flags.format,
    )
}

fn write_shifted(input: &Path, output: &Path, column: &str, offset: f64) -> anyhow::Result<usize> {
    let data = Dataset::from_csv_path(input)
        .with_context(|| format!("failed to read dataset {}", input.display()))?;
    let shifted = data.with_offset(column, offset)?;
    shifted
        .write_csv(output)
        .with_context(|| format!("failed to write dataset {}", output.display()))?;
    Ok(shifted.len())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn shifted_copy_offsets_only_the_target_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out/drifted.csv");
        std::fs::write(&input, "year,forecast\n2000,10\n2001,12\n").unwrap();

        let rows = write_shifted(&input, &output, "forecast", 8.5).unwrap();
        assert_eq!(rows, 2);

        let shifted = Dataset::from_csv_path(&output).unwrap();
        assert_eq!(shifted.column("forecast").unwrap(), &[18.5, 20.5]);
        assert_eq!(shifted.column("year").unwrap(), &[2000.0, 2001.0]);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "year,forecast\n2000,10\n").unwrap();
        assert!(write_shifted(&input, &dir.path().join("o.csv"), "missing", 1.0).is_err());
    }
}
