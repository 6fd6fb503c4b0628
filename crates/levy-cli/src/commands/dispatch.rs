use levy_config::LevyConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    config: LevyConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Check(args) => commands::check::handle(&args, config, flags),
        Commands::Schedule(args) => commands::schedule::handle(&args, config, flags).await,
        Commands::Retrain(args) => commands::retrain::handle(&args, &config, flags),
        Commands::History => commands::history::handle(&config, flags),
        Commands::SimulateDrift(args) => commands::simulate::handle(&args, &config, flags),
    }
}
