//! topbase::fork
//!
//! Content-based fork point resolution.
//!
//! # Design
//!
//! Finding where two branches diverged is a content-addressed equivalence
//! problem here, not an ancestry problem: the source branch's history has
//! typically been rewritten by a tree filter, so its commits share no
//! hashes with the target even where their changes are identical. The
//! resolver therefore walks the target branch newest-first and looks for
//! the first commit whose patch fingerprint also occurs in the source
//! branch's merge-free history. That source-side commit is the fork point.
//!
//! When a fingerprint occurs more than once on the source side, the
//! oldest occurrence wins. Over-approximating the series this way is
//! safe: replay skips changes that are already present, while matching a
//! newer duplicate would silently drop the commits beneath it.

use std::collections::HashMap;

use crate::core::types::{BranchName, Oid, PatchId};
use crate::graph::CommitGraph;

use super::fingerprint::patch_id;
use super::ReconcileError;

/// Where two diverging histories are considered equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkPoint {
    /// The source-side commit at which the branches agree.
    Commit(Oid),

    /// No agreement found; the entire source history is new.
    ///
    /// Not fatal: reconciliation proceeds from the repository root and
    /// replays everything, at the cost of a warning to the user.
    Root,
}

impl ForkPoint {
    /// The exclusive stop commit for the series builder, if any.
    pub fn stop_at(&self) -> Option<&Oid> {
        match self {
            ForkPoint::Commit(oid) => Some(oid),
            ForkPoint::Root => None,
        }
    }
}

/// Resolve the fork point between `source` and `target`.
///
/// Merge commits on either side are excluded from consideration; they are
/// never fingerprinted.
///
/// # Errors
///
/// `UnknownBranch` if either branch is absent; accessor failures
/// otherwise.
pub fn resolve_fork_point<G: CommitGraph + ?Sized>(
    graph: &G,
    source: &BranchName,
    target: &BranchName,
) -> Result<ForkPoint, ReconcileError> {
    // Fingerprints of the source branch's merge-free history, keyed by
    // patch id. Later inserts overwrite earlier ones, so walking
    // newest-first leaves the oldest occurrence of each duplicate.
    let mut source_prints: HashMap<PatchId, Oid> = HashMap::new();
    for meta in graph.list_commits(source)? {
        if meta.is_merge() {
            continue;
        }
        let print = patch_id(graph, &meta.oid)?;
        source_prints.insert(print, meta.oid);
    }

    // First agreement scanning from the target tip backward.
    for meta in graph.list_commits(target)? {
        if meta.is_merge() {
            continue;
        }
        let print = patch_id(graph, &meta.oid)?;
        if let Some(oid) = source_prints.get(&print) {
            return Ok(ForkPoint::Commit(oid.clone()));
        }
    }

    Ok(ForkPoint::Root)
}
