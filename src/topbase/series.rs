//! topbase::series
//!
//! Commit series construction.
//!
//! A [`CommitSeries`] is the ordered, merge-free list of commits unique to
//! a branch beyond a stop point: oldest first, first-parent line only.
//! Merge commits are omitted entirely; their own changes are dropped and
//! the walk continues along the first parent. The series records how many
//! merges were skipped so the fast-forward optimizer can refuse ranges
//! that contained one.

use crate::core::types::{BranchName, Oid};
use crate::graph::{CommitGraph, CommitMeta};

use super::ReconcileError;

/// An ordered, merge-free sequence of commits, oldest first.
///
/// Transient: rebuilt on every reconciliation, never persisted.
#[derive(Debug, Clone)]
pub struct CommitSeries {
    commits: Vec<CommitMeta>,
    skipped_merges: usize,
}

impl CommitSeries {
    /// The commits in replay order (oldest first).
    pub fn commits(&self) -> &[CommitMeta] {
        &self.commits
    }

    /// Number of commits in the series.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the series is empty (reconciliation is a no-op).
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Whether any merge commit was skipped in the walked range.
    ///
    /// A skipped merge disqualifies fast-forward: merge commits must never
    /// propagate into the target history, so the range has to be replayed.
    pub fn has_skipped_merges(&self) -> bool {
        self.skipped_merges > 0
    }

    /// The newest commit of the series, if any.
    pub fn newest(&self) -> Option<&CommitMeta> {
        self.commits.last()
    }
}

/// Build the series of commits unique to `branch` above `stop_at`.
///
/// Walks first-parent history from the branch tip, collecting non-merge
/// commits until `stop_at` (exclusive) is reached. `None` walks all the
/// way down to the root, which happens when no fork point was found and
/// the entire branch is considered new.
///
/// # Errors
///
/// Propagates accessor failures; `UnknownBranch` if the branch is absent.
pub fn build_series<G: CommitGraph + ?Sized>(
    graph: &G,
    branch: &BranchName,
    stop_at: Option<&Oid>,
) -> Result<CommitSeries, ReconcileError> {
    let mut commits = Vec::new();
    let mut skipped_merges = 0;

    for meta in graph.list_commits(branch)? {
        if Some(&meta.oid) == stop_at {
            break;
        }
        if meta.is_merge() {
            skipped_merges += 1;
            continue;
        }
        commits.push(meta);
    }

    commits.reverse();
    Ok(CommitSeries {
        commits,
        skipped_merges,
    })
}
