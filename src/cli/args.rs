//! cli::args
//!
//! Command-line argument definitions using clap derive.

use clap::Parser;
use std::path::PathBuf;

/// Reattach a rewritten branch onto a comparison branch.
///
/// Finds the true fork point between SOURCE and TARGET by patch content
/// rather than ancestry, then fast-forwards TARGET when possible
/// (preserving commit hashes) or replays SOURCE's unique non-merge
/// commits on top of it.
#[derive(Parser, Debug)]
#[command(name = "topbase")]
#[command(author, version, about)]
pub struct Cli {
    /// Branch whose unique commits are reattached
    pub source: String,

    /// Branch to update (defaults to the current branch)
    pub target: Option<String>,

    /// Use the rebase pipeline, selecting the base explicitly
    #[arg(long)]
    pub rebase: bool,

    /// Replay atop this branch instead of the target; implies --rebase
    #[arg(long, value_name = "BRANCH")]
    pub onto: Option<String>,

    /// Show what would be done without moving any ref
    #[arg(long)]
    pub dry_run: bool,

    /// Run as if topbase was started in this directory
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
