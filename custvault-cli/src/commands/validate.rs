//! `custvault validate <template>...`: exit 1 when any issue is found.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use custvault_template::validate;

/// Check template files for syntax and naming problems.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Template files to check.
    #[arg(required = true)]
    pub templates: Vec<PathBuf>,
}

impl ValidateArgs {
    pub fn run(self, config_override: Option<&Path>) -> Result<ExitCode> {
        let (home, config) = super::load_or_default(config_override)?;
        let run = super::prepare(&home, config)?;

        let mut total = 0;
        for path in &self.templates {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read '{}'", path.display()))?;
            let issues = validate(&text, &run.registry);
            if issues.is_empty() {
                println!("{} {}", "✓".green(), path.display());
                continue;
            }
            total += issues.len();
            println!("{} {}", "✗".red(), path.display());
            for issue in issues {
                println!("  {issue}");
            }
        }

        if total == 0 {
            return Ok(ExitCode::SUCCESS);
        }
        println!("{total} issue(s) found.");
        Ok(ExitCode::from(1))
    }
}
