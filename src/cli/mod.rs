//! CLI type definitions
//!
//! This module contains the clap command structures that define the CLI
//! interface, plus the shared error reporting path.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;

pub mod commands;

#[derive(Parser)]
#[command(name = "mender")]
#[command(about = "Mender - self-learning incident remediation agent", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a config file (defaults to .mender/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a learning session against the simulated production system
    Run(RunArgs),

    /// Show learned strategy rankings
    Rankings(RankingsArgs),

    /// Show recent remediation experiences
    History(HistoryArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Number of incident cycles to run (overrides config)
    #[arg(short = 'n', long)]
    pub cycles: Option<u32>,

    /// RNG seed for a reproducible session (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only generate incidents of this type
    #[arg(long)]
    pub incident_type: Option<String>,
}

#[derive(Args)]
pub struct RankingsArgs {
    /// Filter by incident type
    #[arg(long)]
    pub incident_type: Option<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Filter by incident type
    #[arg(long)]
    pub incident_type: Option<String>,

    /// Maximum number of experiences to display
    #[arg(short, long, default_value = "20")]
    pub limit: u32,
}

/// Report a top-level error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{err:#}") }));
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(1);
}
