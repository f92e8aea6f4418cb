//! Topbase - history reconciliation for split monorepo branches
//!
//! Topbase reattaches a rewritten branch of commits onto a comparison
//! branch so the two can be fast-forwarded or cleanly layered. It is the
//! reconciliation half of a monorepo-splitting toolchain: the tree-filter
//! step produces a candidate branch whose ancestry no longer connects to
//! the comparison branch, and topbase finds the true content-equivalent
//! fork point, discards merge noise, and replays what is genuinely new.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`topbase`] - The reconciliation pipeline: fingerprints, fork-point
//!   resolution, series construction, fast-forward, replay
//! - [`graph`] - Commit graph accessor trait plus test/dry-run doubles
//! - [`git`] - git2-backed accessor; the single doorway to Git
//! - [`core`] - Strong domain types
//! - [`ui`] - User-facing output utilities
//!
//! # Correctness Invariants
//!
//! 1. The target branch ref is updated exactly once, only on full success
//! 2. Merge commits never propagate into a reconciled history
//! 3. A pure fast-forward preserves original commit hashes bit for bit
//! 4. Reconciliation is idempotent

pub mod cli;
pub mod core;
pub mod git;
pub mod graph;
pub mod topbase;
pub mod ui;
