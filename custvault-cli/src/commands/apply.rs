//! `custvault apply`: create missing folders and write index notes.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use custvault_sync::{ApplyResult, DirResult, WriteResult};

/// Arguments for `custvault apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Show what would be created or written without touching anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    pub fn run(self, config_override: Option<&Path>) -> Result<ExitCode> {
        let (home, config) = super::load(config_override)?;
        let run = super::prepare(&home, config)?;
        let result = run.apply(self.dry_run).context("apply failed")?;
        print_results(&result, self.dry_run);
        Ok(ExitCode::SUCCESS)
    }
}

fn print_results(result: &ApplyResult, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if result.changed() == 0 {
        println!("{prefix}✓ nothing to do");
        return;
    }

    let unchanged = result
        .writes
        .iter()
        .filter(|w| matches!(w, WriteResult::Unchanged { .. }))
        .count();
    println!(
        "{prefix}✓ applied ({} changed, {} unchanged)",
        result.changed(),
        unchanged
    );

    for d in &result.dirs {
        match d {
            DirResult::Created { path } => println!("  +  {}", path.display()),
            DirResult::WouldCreate { path } => println!("  ~  {}", path.display()),
            DirResult::Existing { .. } => {}
        }
    }
    for w in &result.writes {
        match w {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Unchanged { path } => println!("  ·  {}", path.display()),
        }
    }
}
