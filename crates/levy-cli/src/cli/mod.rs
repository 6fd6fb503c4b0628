use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `levyml` binary.
#[derive(Debug, Parser)]
#[command(name = "levyml", version, about = "Levy model drift monitoring and retraining")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra TOML config file, layered above the discovered ones
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Training dataset (CSV)
    #[arg(long, global = true)]
    pub data_path: Option<PathBuf>,

    /// Model artifact
    #[arg(long, global = true)]
    pub model_path: Option<PathBuf>,

    /// Metrics snapshot
    #[arg(long, global = true)]
    pub metrics_path: Option<PathBuf>,

    /// Directory for the drift check and notification logs
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            config: self.config.clone(),
            data_path: self.data_path.clone(),
            model_path: self.model_path.clone(),
            metrics_path: self.metrics_path.clone(),
            log_dir: self.log_dir.clone(),
        }
    }
}
