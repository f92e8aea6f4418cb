//! graph
//!
//! Commit graph accessor abstraction.
//!
//! # Design
//!
//! The [`CommitGraph`] trait is the repository handle passed explicitly
//! through the reconciliation pipeline. The orchestrator, fork-point
//! resolver, and replay engine are written against this trait rather than
//! against git2, so they can be exercised with the in-memory
//! [`mock::InMemoryGraph`] without touching a real repository. The
//! production implementation lives in [`crate::git`].
//!
//! # Invariants
//!
//! - `list_commits` returns first-parent history, newest first
//! - `patch_text` is defined only for commits with at most one parent
//! - `move_branch` is atomic and compare-and-swap guarded

pub mod dry_run;
pub mod mock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from commit graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Named branch does not exist.
    #[error("unknown branch: {branch}")]
    UnknownBranch {
        /// The branch that was not found
        branch: String,
    },

    /// Asked for the patch of a merge commit.
    ///
    /// Merge commits have no single-parent diff and are never
    /// fingerprinted; callers must filter them out first.
    #[error("cannot compute patch of merge commit {oid}")]
    MergeCommit {
        /// The offending commit
        oid: Oid,
    },

    /// A cherry-pick did not apply cleanly.
    #[error("conflict applying commit {commit}")]
    Conflict {
        /// The commit whose change failed to apply
        commit: Oid,
    },

    /// Compare-and-swap precondition failed on a ref move.
    ///
    /// The branch moved between scan and publish; nothing was mutated.
    #[error("branch {branch} moved: expected {expected}, found {actual}")]
    RefMoved {
        /// The branch being updated
        branch: String,
        /// The tip observed at scan time
        expected: String,
        /// The tip found at publish time
        actual: String,
    },

    /// Object not found in the repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The missing object id
        oid: String,
    },

    /// Underlying storage engine error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<TypeError> for GraphError {
    fn from(err: TypeError) -> Self {
        GraphError::Internal {
            message: err.to_string(),
        }
    }
}

/// Metadata for a single commit, as read from the graph.
#[derive(Debug, Clone)]
pub struct CommitMeta {
    /// The commit OID
    pub oid: Oid,
    /// Parent OIDs: empty for a root, two or more for a merge
    pub parents: Vec<Oid>,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub author_time: DateTime<Utc>,
}

impl CommitMeta {
    /// Whether this commit is a merge (more than one parent).
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Whether this commit is a root (no parents).
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// First parent, if any. Traversal follows this line exclusively.
    pub fn first_parent(&self) -> Option<&Oid> {
        self.parents.first()
    }
}

/// Read/write view over a commit graph.
///
/// Implementations: [`crate::git::Git`] (git2-backed, production) and
/// [`mock::InMemoryGraph`] (deterministic test double). A single
/// invocation owns the repository for its duration; no methods suspend
/// or overlap.
pub trait CommitGraph {
    /// Resolve a branch name to its tip commit.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownBranch`] if the branch does not exist.
    fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GraphError>;

    /// List commits reachable from a branch tip along first-parent
    /// history, newest first, down to the root.
    fn list_commits(&self, branch: &BranchName) -> Result<Vec<CommitMeta>, GraphError>;

    /// Unified diff of a commit against its single parent.
    ///
    /// Root commits are diffed against the empty tree. The bytes contain
    /// only content-derived data (paths, hunks, modes, blob ids), never
    /// the commit hash, author, or message.
    ///
    /// # Errors
    ///
    /// [`GraphError::MergeCommit`] for commits with more than one parent.
    fn patch_text(&self, commit: &Oid) -> Result<Vec<u8>, GraphError>;

    /// Re-create `commit`'s change as a new commit with parent `onto`,
    /// reusing the original author, committer, message, and authored
    /// timestamp. The new commit is created ref-less; no reference is
    /// updated.
    ///
    /// Returns `None` when the change is already contained in `onto`
    /// (an empty pick); callers skip such commits.
    ///
    /// # Errors
    ///
    /// [`GraphError::Conflict`] if the change does not apply cleanly.
    fn cherry_pick(&self, commit: &Oid, onto: &Oid) -> Result<Option<Oid>, GraphError>;

    /// Rebind a branch to a new tip, atomically, only if the branch still
    /// points at `expected_old`.
    ///
    /// # Errors
    ///
    /// [`GraphError::RefMoved`] if the branch changed since scan.
    fn move_branch(
        &self,
        branch: &BranchName,
        new_tip: &Oid,
        expected_old: &Oid,
    ) -> Result<(), GraphError>;

    /// Whether the working tree is clean (no staged or unstaged changes).
    ///
    /// Precondition check; reconciliation refuses to start otherwise.
    fn is_clean(&self) -> Result<bool, GraphError>;
}
