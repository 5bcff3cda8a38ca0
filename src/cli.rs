use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "groundwork")]
#[command(version)]
#[command(about = "Declarative host provisioning - declare state, plan, converge", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the desired-state manifest
    #[arg(short, long, default_value = "groundwork.toml", global = true)]
    pub manifest: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what apply would do, without touching the host
    Plan,

    /// Converge the host to the manifest
    Apply(ApplyArgs),

    /// Show observed host state for every declared resource
    Facts,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Walk the plan and report outcomes without mutating the host
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Keep executing after a failed action
    #[arg(long)]
    pub continue_on_error: bool,

    /// Per-action timeout in seconds
    #[arg(long, default_value = "300")]
    pub timeout: u64,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Run lock path (defaults to groundwork.lock in the temp dir)
    #[arg(long)]
    pub lock_file: Option<PathBuf>,
}
