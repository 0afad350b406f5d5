//! `custvault diff`: what `apply` would change, as a structure diff.
//!
//! Exit code 0 when the structure is clean, 1 when changes are pending.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use custvault_sync::{content_diffs, Classification, DiffEntry, DiffReport, OrphanMode};

/// Arguments for `custvault diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// List orphaned customer folders as removals.
    #[arg(long)]
    pub destructive: bool,

    /// Also show unified diffs of index note content.
    #[arg(long, conflicts_with = "json")]
    pub content: bool,
}

impl DiffArgs {
    pub fn run(self, config_override: Option<&Path>) -> Result<ExitCode> {
        let (home, config) = super::load(config_override)?;
        let run = super::prepare(&home, config)?;

        let mode = if self.destructive {
            OrphanMode::Destructive
        } else {
            OrphanMode::Report
        };
        let report = run.diff(mode).context("structure diff failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize diff JSON")?
            );
        } else {
            print_report(&report);
            if self.content {
                let diffs = content_diffs(run.config.root(), &run.plan())
                    .context("content diff failed")?;
                for diff in diffs {
                    print!("{}", diff.unified_diff);
                    if !diff.unified_diff.ends_with('\n') {
                        println!();
                    }
                }
            }
        }

        Ok(if report.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        })
    }
}

fn print_report(report: &DiffReport) {
    for entry in report
        .entries
        .iter()
        .filter(|e| e.classification != Classification::Unchanged)
    {
        println!("{}", format_entry(entry));
    }

    if !report.orphans.is_empty() && report.counts().removed == 0 {
        for orphan in &report.orphans {
            println!(
                "  {}  {} (not configured; pass --destructive to list as removal)",
                "?".magenta(),
                orphan.path.display()
            );
        }
    }

    let c = report.counts();
    println!(
        "{} added, {} modified, {} removed, {} unchanged",
        c.added.to_string().green(),
        c.modified.to_string().yellow(),
        c.removed.to_string().red(),
        c.unchanged
    );
    if report.is_clean() {
        println!("✓ Structure is up to date.");
    }
}

fn format_entry(entry: &DiffEntry) -> String {
    let marker = match entry.classification {
        Classification::Added => "+".green(),
        Classification::Modified => "~".yellow(),
        Classification::Removed => "-".red(),
        Classification::Unchanged => "·".bright_black(),
    };
    format!(
        "  {marker}  {}  {}",
        entry.path.display(),
        format!("({})", entry.reason).bright_black()
    )
}
