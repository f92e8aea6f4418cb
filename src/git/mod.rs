//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. All repository reads and
//! writes flow through [`Git`], which implements the
//! [`CommitGraph`](crate::graph::CommitGraph) trait consumed by the
//! reconciliation pipeline. No other module imports `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - First-parent commit enumeration
//! - Single-parent patch extraction (for fingerprinting)
//! - Ref-less cherry-picks (for replay)
//! - CAS-guarded branch moves
//! - Working tree cleanliness checks
//!
//! # Invariants
//!
//! - Branch moves use compare-and-swap semantics
//! - Replay creates objects without touching the working tree or index
//! - No other module calls git2 directly

mod interface;

pub use interface::{Git, GitError};
