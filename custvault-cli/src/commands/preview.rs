//! `custvault preview <template> [--entity ID] [--category NAME]`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use custvault_core::{CategoryName, EntityId};
use custvault_template::{preview_file, ExpansionContext};

/// Expand a template file and print it. Nothing is written.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Template file to expand.
    pub template: PathBuf,

    /// Customer id to expand for; defaults to the first configured id, else 1.
    #[arg(long, value_name = "ID")]
    pub entity: Option<u32>,

    /// Section name; empty when omitted.
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,
}

impl PreviewArgs {
    pub fn run(self, config_override: Option<&Path>) -> Result<ExitCode> {
        let (home, config) = super::load_or_default(config_override)?;
        let run = super::prepare(&home, config)?;

        let id = self
            .entity
            .map(EntityId)
            .or_else(|| run.config.entity_ids.first().copied())
            .unwrap_or(EntityId(1));
        let code = run.config.naming.entity_code(id, run.config.id_width);
        let ctx = ExpansionContext::new(
            code,
            self.category.map(CategoryName::from),
            run.ambient.clone(),
        )
        .with_naming(&run.config.naming);

        let text = preview_file(&self.template, &ctx, &run.registry)
            .with_context(|| format!("cannot preview '{}'", self.template.display()))?;
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
        Ok(ExitCode::SUCCESS)
    }
}
