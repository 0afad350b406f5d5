pub mod apply;
pub mod diff;
pub mod init;
pub mod preview;
pub mod status;
pub mod validate;
pub mod vars;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use custvault_core::{config, ConfigError, VaultConfig};
use custvault_sync::Run;

pub(crate) fn home() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

fn config_file(home: &Path, config_override: Option<&Path>) -> PathBuf {
    config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config::config_path_at(home))
}

/// Load the config from `--config` or `~/.custvault/config.yaml`.
pub(crate) fn load(config_override: Option<&Path>) -> Result<(PathBuf, VaultConfig)> {
    let home = home()?;
    let path = config_file(&home, config_override);
    let config = config::load_from(&path)
        .with_context(|| format!("failed to load {} — run `custvault init` first", path.display()))?;
    Ok((home, config))
}

/// Like [`load`], but a missing config file yields defaults rooted at the
/// current directory. Used by commands that only expand templates.
pub(crate) fn load_or_default(config_override: Option<&Path>) -> Result<(PathBuf, VaultConfig)> {
    let home = home()?;
    let path = config_file(&home, config_override);
    match config::load_from(&path) {
        Ok(config) => Ok((home, config)),
        Err(ConfigError::ConfigNotFound { .. }) => {
            tracing::debug!("no config at {}, using defaults", path.display());
            let cwd = std::env::current_dir().context("cannot read current directory")?;
            Ok((home, VaultConfig::new(cwd)))
        }
        Err(err) => Err(err).with_context(|| format!("failed to load {}", path.display())),
    }
}

pub(crate) fn prepare(home: &Path, config: VaultConfig) -> Result<Run> {
    Run::prepare(home, config).context("failed to prepare templates and variables")
}
