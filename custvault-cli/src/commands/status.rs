//! `custvault status`: per-customer completeness.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use custvault_sync::{summarize, EntityState, EntityStatus, Orphan, OrphanMode};

/// Arguments for `custvault status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, config_override: Option<&Path>) -> Result<ExitCode> {
        let (home, config) = super::load(config_override)?;
        let run = super::prepare(&home, config)?;
        let report = run
            .diff(OrphanMode::Report)
            .context("structure diff failed")?;
        let rows = summarize(&report);

        if self.json {
            print_json(&rows, &report.orphans)?;
        } else {
            print_table(run.config.root(), rows, &report.orphans);
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    summary: StatusSummaryJson,
    customers: &'a [EntityStatus],
    orphans: &'a [Orphan],
}

#[derive(Serialize)]
struct StatusSummaryJson {
    customers: usize,
    complete: usize,
    orphans: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "customer")]
    customer: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "present")]
    present: String,
}

fn complete_count(rows: &[EntityStatus]) -> usize {
    rows.iter()
        .filter(|r| r.state == EntityState::Complete)
        .count()
}

fn print_json(rows: &[EntityStatus], orphans: &[Orphan]) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            customers: rows.len(),
            complete: complete_count(rows),
            orphans: orphans.len(),
        },
        customers: rows,
        orphans,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(root: &Path, rows: Vec<EntityStatus>, orphans: &[Orphan]) {
    println!(
        "Custvault v{} | {} | {} customers | {} complete",
        env!("CARGO_PKG_VERSION"),
        root.display(),
        rows.len(),
        complete_count(&rows),
    );

    if rows.is_empty() {
        println!("No customers configured.");
        return;
    }

    let separator = "■".repeat(48).bright_black().to_string();
    println!("{separator}");
    println!(
        "Indicators: {} COMPLETE  {} PARTIAL  {} MISSING",
        state_indicator(&EntityState::Complete),
        state_indicator(&EntityState::Partial { missing: 0 }),
        state_indicator(&EntityState::Missing),
    );
    println!("{separator}");

    let needs_apply = rows.iter().any(|r| r.state != EntityState::Complete);
    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            customer: row.entity.to_string(),
            status: format!("{} {}", state_indicator(&row.state), state_label(&row.state)),
            present: format!("{}/{}", row.present, row.expected),
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    for orphan in orphans {
        println!(
            "{} {} is not configured",
            "■".magenta().bold(),
            orphan.name
        );
    }
    if needs_apply {
        println!("Run 'custvault apply' to create missing folders and notes.");
    }
}

fn state_label(state: &EntityState) -> String {
    match state {
        EntityState::Complete => "COMPLETE".to_string(),
        EntityState::Partial { missing } => format!("PARTIAL ({missing} missing)"),
        EntityState::Missing => "MISSING".to_string(),
    }
}

fn state_indicator(state: &EntityState) -> String {
    match state {
        EntityState::Complete => "■".green().bold().to_string(),
        EntityState::Partial { .. } => "■".yellow().bold().to_string(),
        EntityState::Missing => "■".red().bold().to_string(),
    }
}
