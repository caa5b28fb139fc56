//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "lexis", version, about = "Search-engine wrapper and Doc2Vec sentiment benchmark")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub robot: bool,

    /// Config file (replaces the global and project files)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Search profile JSON (overrides search.profile_path)
    #[arg(long, global = true, value_name = "PATH")]
    pub profile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
