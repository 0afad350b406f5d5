//! `custvault vars`: built-in and custom template variables.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use custvault_template::Builtin;

/// Arguments for `custvault vars`.
#[derive(Args, Debug)]
pub struct VarsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct VarRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "source")]
    source: &'static str,
    #[tabled(rename = "description")]
    description: String,
}

impl VarsArgs {
    pub fn run(self, config_override: Option<&Path>) -> Result<ExitCode> {
        let (home, config) = super::load_or_default(config_override)?;
        let run = super::prepare(&home, config)?;

        let mut rows: Vec<VarRow> = Builtin::all()
            .iter()
            .map(|b| VarRow {
                name: b.name().to_string(),
                source: if b.is_volatile() { "built-in*" } else { "built-in" },
                description: b.description().to_string(),
            })
            .collect();
        rows.extend(run.registry.custom().map(|(name, value)| VarRow {
            name: name.to_string(),
            source: "custom",
            description: format!("= {value:?}"),
        }));

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize vars JSON")?
            );
            return Ok(ExitCode::SUCCESS);
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("* changes between runs");
        Ok(ExitCode::SUCCESS)
    }
}
