//! Custvault: customer workspace scaffolding for note vaults.
//!
//! # Usage
//!
//! ```text
//! custvault init <root> [--entities 1,2] [--categories FP,RAISED] [--width 3]
//! custvault diff [--json] [--destructive] [--content]
//! custvault status [--json]
//! custvault apply [--dry-run]
//! custvault preview <template> [--entity ID] [--category NAME]
//! custvault validate <template>...
//! custvault vars
//! ```
//!
//! Every command accepts `--config <path>` in place of
//! `~/.custvault/config.yaml`. Logging goes to stderr; set `RUST_LOG` to
//! raise it above `warn`.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    apply::ApplyArgs, diff::DiffArgs, init::InitArgs, preview::PreviewArgs, status::StatusArgs,
    validate::ValidateArgs, vars::VarsArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "custvault",
    version,
    about = "Scaffold and reconcile customer workspaces in a note vault",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ~/.custvault/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a config for a structure root.
    Init(InitArgs),

    /// Compare the configured structure with the filesystem.
    Diff(DiffArgs),

    /// Per-customer completeness of the structure.
    Status(StatusArgs),

    /// Create missing folders and write index notes.
    Apply(ApplyArgs),

    /// Expand a template file without writing anything.
    Preview(PreviewArgs),

    /// Check template files for syntax and naming problems.
    Validate(ValidateArgs),

    /// List built-in and custom template variables.
    Vars(VarsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init(args) => args.run(config),
        Commands::Diff(args) => args.run(config),
        Commands::Status(args) => args.run(config),
        Commands::Apply(args) => args.run(config),
        Commands::Preview(args) => args.run(config),
        Commands::Validate(args) => args.run(config),
        Commands::Vars(args) => args.run(config),
    }
}
