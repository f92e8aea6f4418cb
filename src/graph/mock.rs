//! graph::mock
//!
//! In-memory commit graph for deterministic testing.
//!
//! # Design
//!
//! `InMemoryGraph` implements [`CommitGraph`](super::CommitGraph) over a
//! hand-built DAG. Commits carry synthetic OIDs and scripted patch bytes,
//! so fingerprint matching behaves exactly as it does against a real
//! repository while tests stay hermetic. Conflicts during cherry-pick are
//! scripted per commit, and ref moves are recorded for verification.
//!
//! # Example
//!
//! ```
//! use topbase::core::types::BranchName;
//! use topbase::graph::mock::InMemoryGraph;
//! use topbase::graph::CommitGraph;
//!
//! let graph = InMemoryGraph::new();
//! let root = graph.commit(None, "init", "+readme\n");
//! let a = graph.commit(Some(&root), "add a", "+a\n");
//! graph.branch("master", &a);
//!
//! let master = BranchName::new("master").unwrap();
//! let commits = graph.list_commits(&master).unwrap();
//! assert_eq!(commits.len(), 2);
//! assert_eq!(commits[0].oid, a);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::DateTime;

use crate::core::types::{BranchName, Oid};

use super::{CommitGraph, CommitMeta, GraphError};

/// In-memory commit graph for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct InMemoryGraph {
    inner: Arc<Mutex<Inner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct Inner {
    /// Stored commits by OID.
    commits: HashMap<Oid, StoredCommit>,
    /// Branch tips by name.
    branches: HashMap<BranchName, Oid>,
    /// Working tree cleanliness answer.
    clean: bool,
    /// Commits whose cherry-pick is scripted to conflict.
    conflicts: HashSet<Oid>,
    /// Counter for synthetic OIDs.
    next_id: u64,
    /// Recorded ref moves for verification.
    moves: Vec<RecordedMove>,
}

#[derive(Debug, Clone)]
struct StoredCommit {
    meta: CommitMeta,
    /// Scripted patch bytes; what the fingerprint computer hashes.
    patch: Vec<u8>,
}

/// A recorded `move_branch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub branch: BranchName,
    pub new_tip: Oid,
    pub old_tip: Oid,
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGraph {
    /// Create an empty graph with a clean working tree.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                commits: HashMap::new(),
                branches: HashMap::new(),
                clean: true,
                conflicts: HashSet::new(),
                next_id: 1,
                moves: Vec::new(),
            })),
        }
    }

    /// Add a commit with the given single parent and scripted patch.
    ///
    /// Pass `None` for a root commit. Returns the synthetic OID.
    pub fn commit(&self, parent: Option<&Oid>, summary: &str, patch: &str) -> Oid {
        let mut inner = self.inner.lock().unwrap();
        let parents = parent.into_iter().cloned().collect();
        inner.add_commit(parents, summary, patch.as_bytes().to_vec())
    }

    /// Add a merge commit with two parents.
    ///
    /// Merge commits carry no single-parent patch; `patch_text` errors.
    pub fn merge(&self, first: &Oid, second: &Oid, summary: &str) -> Oid {
        let mut inner = self.inner.lock().unwrap();
        inner.add_commit(vec![first.clone(), second.clone()], summary, Vec::new())
    }

    /// Bind a branch name to a tip.
    pub fn branch(&self, name: &str, tip: &Oid) {
        let branch = BranchName::new(name).expect("valid branch name in test");
        self.inner
            .lock()
            .unwrap()
            .branches
            .insert(branch, tip.clone());
    }

    /// Script the working tree cleanliness answer.
    pub fn set_clean(&self, clean: bool) {
        self.inner.lock().unwrap().clean = clean;
    }

    /// Script a conflict when cherry-picking the given commit.
    pub fn fail_pick_on(&self, commit: &Oid) {
        self.inner.lock().unwrap().conflicts.insert(commit.clone());
    }

    /// Get the recorded ref moves, in order.
    pub fn recorded_moves(&self) -> Vec<RecordedMove> {
        self.inner.lock().unwrap().moves.clone()
    }

    /// Fetch a commit's summary. Panics if absent (test helper).
    pub fn summary_of(&self, oid: &Oid) -> String {
        self.inner.lock().unwrap().commits[oid].meta.summary.clone()
    }

    /// Fetch a commit's parents. Panics if absent (test helper).
    pub fn parents_of(&self, oid: &Oid) -> Vec<Oid> {
        self.inner.lock().unwrap().commits[oid].meta.parents.clone()
    }
}

impl Inner {
    fn add_commit(&mut self, parents: Vec<Oid>, summary: &str, patch: Vec<u8>) -> Oid {
        let id = self.next_id;
        self.next_id += 1;

        let oid = Oid::new(format!("{id:040x}")).expect("synthetic oid is valid hex");
        let meta = CommitMeta {
            oid: oid.clone(),
            parents,
            summary: summary.to_string(),
            message: format!("{summary}\n"),
            author_name: "Mock Author".to_string(),
            author_email: "mock@example.com".to_string(),
            author_time: DateTime::from_timestamp(id as i64, 0)
                .unwrap_or(DateTime::UNIX_EPOCH)
                .with_timezone(&chrono::Utc),
        };
        self.commits.insert(oid.clone(), StoredCommit { meta, patch });
        oid
    }

    fn get(&self, oid: &Oid) -> Result<&StoredCommit, GraphError> {
        self.commits.get(oid).ok_or_else(|| GraphError::ObjectNotFound {
            oid: oid.to_string(),
        })
    }

    /// First-parent walk from `tip` down to the root, newest first.
    fn first_parent_walk(&self, tip: &Oid) -> Result<Vec<CommitMeta>, GraphError> {
        let mut out = Vec::new();
        let mut cursor = Some(tip.clone());
        while let Some(oid) = cursor {
            let stored = self.get(&oid)?;
            cursor = stored.meta.first_parent().cloned();
            out.push(stored.meta.clone());
        }
        Ok(out)
    }
}

impl CommitGraph for InMemoryGraph {
    fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GraphError> {
        let inner = self.inner.lock().unwrap();
        inner
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| GraphError::UnknownBranch {
                branch: branch.to_string(),
            })
    }

    fn list_commits(&self, branch: &BranchName) -> Result<Vec<CommitMeta>, GraphError> {
        let inner = self.inner.lock().unwrap();
        let tip = inner
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| GraphError::UnknownBranch {
                branch: branch.to_string(),
            })?;
        inner.first_parent_walk(&tip)
    }

    fn patch_text(&self, commit: &Oid) -> Result<Vec<u8>, GraphError> {
        let inner = self.inner.lock().unwrap();
        let stored = inner.get(commit)?;
        if stored.meta.is_merge() {
            return Err(GraphError::MergeCommit {
                oid: commit.clone(),
            });
        }
        Ok(stored.patch.clone())
    }

    fn cherry_pick(&self, commit: &Oid, onto: &Oid) -> Result<Option<Oid>, GraphError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.conflicts.contains(commit) {
            return Err(GraphError::Conflict {
                commit: commit.clone(),
            });
        }

        let source = inner.get(commit)?.clone();
        inner.get(onto)?;

        // The change is already present if any commit on the target's
        // first-parent line carries identical patch bytes.
        let already_present = inner
            .first_parent_walk(onto)?
            .iter()
            .any(|meta| inner.commits[&meta.oid].patch == source.patch && !source.patch.is_empty());
        if already_present {
            return Ok(None);
        }

        let new_oid = inner.add_commit(
            vec![onto.clone()],
            &source.meta.summary.clone(),
            source.patch.clone(),
        );

        // Replayed commits keep the original author identity and time.
        let original = source.meta;
        let replayed = inner.commits.get_mut(&new_oid).expect("just inserted");
        replayed.meta.author_name = original.author_name;
        replayed.meta.author_email = original.author_email;
        replayed.meta.author_time = original.author_time;
        replayed.meta.message = original.message;

        Ok(Some(new_oid))
    }

    fn move_branch(
        &self,
        branch: &BranchName,
        new_tip: &Oid,
        expected_old: &Oid,
    ) -> Result<(), GraphError> {
        let mut inner = self.inner.lock().unwrap();
        let current = inner
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| GraphError::UnknownBranch {
                branch: branch.to_string(),
            })?;

        if &current != expected_old {
            return Err(GraphError::RefMoved {
                branch: branch.to_string(),
                expected: expected_old.to_string(),
                actual: current.to_string(),
            });
        }

        inner.branches.insert(branch.clone(), new_tip.clone());
        inner.moves.push(RecordedMove {
            branch: branch.clone(),
            new_tip: new_tip.clone(),
            old_tip: current,
        });
        Ok(())
    }

    fn is_clean(&self) -> Result<bool, GraphError> {
        Ok(self.inner.lock().unwrap().clean)
    }
}
