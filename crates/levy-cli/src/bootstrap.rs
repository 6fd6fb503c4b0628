use anyhow::Context;
use levy_config::LevyConfig;

use crate::cli::GlobalFlags;

/// Load layered configuration, then apply command-line path overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<LevyConfig> {
    load_dotenv()?;

    let mut config = LevyConfig::load_from(flags.config.as_deref())
        .context("failed to load levywatch configuration")?;
    apply_overrides(&mut config, flags);
    Ok(config)
}

fn load_dotenv() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let env_path = cwd.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}

fn apply_overrides(config: &mut LevyConfig, flags: &GlobalFlags) {
    if let Some(path) = &flags.data_path {
        config.paths.data_path.clone_from(path);
    }
    if let Some(path) = &flags.model_path {
        config.paths.model_path.clone_from(path);
    }
    if let Some(path) = &flags.metrics_path {
        config.paths.metrics_path = Some(path.clone());
    }
    if let Some(path) = &flags.log_dir {
        config.paths.log_dir.clone_from(path);
    }
}
