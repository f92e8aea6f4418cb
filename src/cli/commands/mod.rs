//! cli::commands
//!
//! Command handlers.

pub mod reconcile;
