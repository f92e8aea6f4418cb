//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and flags
//! - Delegate to the reconciliation pipeline
//! - Does NOT perform repository mutations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::topbase`]. Dry-run is handled here by substituting the
//! read-only accessor wrapper; the pipeline contract is identical either
//! way.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    commands::reconcile::run(&cli)
}
