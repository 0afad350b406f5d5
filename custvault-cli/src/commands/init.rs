//! `custvault init <root> [--entities 1,2] [--categories FP,RAISED] [--width N]`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use custvault_core::{config, CategoryName, EntityId, VaultConfig};

/// Write a config for a structure root.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Absolute or relative path to the structure root inside the vault.
    pub root: PathBuf,

    /// Comma-separated customer ids, e.g. `2,10`.
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub entities: Vec<u32>,

    /// Comma-separated section names applied to every customer.
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub categories: Vec<String>,

    /// Zero-padding width for customer codes (default 3).
    #[arg(long, value_name = "N")]
    pub width: Option<usize>,
}

impl InitArgs {
    pub fn run(self, config_override: Option<&Path>) -> Result<ExitCode> {
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.root.display()))?;
        let entity_ids: Vec<EntityId> = self.entities.into_iter().map(EntityId).collect();
        let categories: Vec<CategoryName> =
            self.categories.into_iter().map(CategoryName::from).collect();

        let (path, cfg) = match config_override {
            Some(path) => (
                path.to_path_buf(),
                init_at_path(path, root.clone(), entity_ids, categories, self.width)?,
            ),
            None => {
                let home = super::home()?;
                let cfg = config::init_config_at(&home, root.clone(), entity_ids, categories, self.width)
                    .with_context(|| format!("failed to init config for '{}'", root.display()))?;
                (config::config_path_at(&home), cfg)
            }
        };

        println!(
            "✓ Config for '{}' ({} customers, {} sections)",
            cfg.root().display(),
            cfg.entity_ids.len(),
            cfg.categories.len()
        );
        println!("  Saved to: {}", path.display());
        Ok(ExitCode::SUCCESS)
    }
}

/// Same idempotent behavior as `init_config_at`, for an explicit file.
fn init_at_path(
    path: &Path,
    root: PathBuf,
    entity_ids: Vec<EntityId>,
    categories: Vec<CategoryName>,
    width: Option<usize>,
) -> Result<VaultConfig> {
    if path.exists() {
        return config::load_from(path).with_context(|| format!("failed to load {}", path.display()));
    }
    let mut cfg = VaultConfig::new(root);
    cfg.entity_ids = entity_ids;
    cfg.categories = categories;
    if let Some(width) = width {
        cfg.id_width = width;
    }
    config::save_to(path, &cfg).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(cfg)
}
