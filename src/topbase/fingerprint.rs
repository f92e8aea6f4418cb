//! topbase::fingerprint
//!
//! Patch fingerprint computation.
//!
//! # Design
//!
//! A commit's fingerprint is the SHA-256 of its diff against its single
//! parent (the empty tree for a root commit). It is a pure function of
//! change content: two commits with byte-identical diffs fingerprint
//! equally no matter how their hashes, authors, timestamps, or messages
//! differ. This is the property that lets the fork-point resolver match
//! commits across branches whose ancestry was severed by a history
//! rewrite, where a plain merge-base would find nothing.
//!
//! Merge commits are never fingerprinted; the accessor refuses to produce
//! a patch for them and reconciliation excludes them before reaching this
//! point.

use sha2::{Digest, Sha256};

use crate::core::types::{Oid, PatchId};
use crate::graph::CommitGraph;

use super::ReconcileError;

/// Compute the content fingerprint of a commit.
///
/// Defined only for commits with zero or one parent.
///
/// # Errors
///
/// Propagates [`GraphError::MergeCommit`](crate::graph::GraphError::MergeCommit)
/// for merge commits and any accessor failure.
pub fn patch_id<G: CommitGraph + ?Sized>(graph: &G, commit: &Oid) -> Result<PatchId, ReconcileError> {
    let patch = graph.patch_text(commit)?;
    let digest = Sha256::digest(&patch);
    Ok(PatchId::from_bytes(digest.into()))
}
