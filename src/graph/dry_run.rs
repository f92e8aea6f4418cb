//! graph::dry_run
//!
//! Read-only accessor substitute for `--dry-run`.
//!
//! # Design
//!
//! Dry-run reuses the identical reconciliation contract against a wrapper
//! that never publishes: reads pass through to the wrapped graph, and
//! `move_branch` records the intended rebind instead of performing it.
//! Cherry-picks still run, so the reported outcome (fork point, series
//! length, conflicts, would-be tip) is exact; against a real repository
//! the commits they create stay ref-less and are garbage-collected.

use std::sync::Mutex;

use crate::core::types::{BranchName, Oid};

use super::{CommitGraph, CommitMeta, GraphError};

/// A branch rebind that would have happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub branch: BranchName,
    pub new_tip: Oid,
    pub old_tip: Oid,
}

/// Wrapper that records ref moves instead of performing them.
#[derive(Debug)]
pub struct DryRunGraph<'a, G: CommitGraph + ?Sized> {
    inner: &'a G,
    moves: Mutex<Vec<PlannedMove>>,
}

impl<'a, G: CommitGraph + ?Sized> DryRunGraph<'a, G> {
    /// Wrap an accessor.
    pub fn new(inner: &'a G) -> Self {
        Self {
            inner,
            moves: Mutex::new(Vec::new()),
        }
    }

    /// The rebinds that would have been performed, in order.
    pub fn planned_moves(&self) -> Vec<PlannedMove> {
        self.moves.lock().unwrap().clone()
    }
}

impl<G: CommitGraph + ?Sized> CommitGraph for DryRunGraph<'_, G> {
    fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GraphError> {
        self.inner.branch_tip(branch)
    }

    fn list_commits(&self, branch: &BranchName) -> Result<Vec<CommitMeta>, GraphError> {
        self.inner.list_commits(branch)
    }

    fn patch_text(&self, commit: &Oid) -> Result<Vec<u8>, GraphError> {
        self.inner.patch_text(commit)
    }

    fn cherry_pick(&self, commit: &Oid, onto: &Oid) -> Result<Option<Oid>, GraphError> {
        self.inner.cherry_pick(commit, onto)
    }

    fn move_branch(
        &self,
        branch: &BranchName,
        new_tip: &Oid,
        expected_old: &Oid,
    ) -> Result<(), GraphError> {
        self.moves.lock().unwrap().push(PlannedMove {
            branch: branch.clone(),
            new_tip: new_tip.clone(),
            old_tip: expected_old.clone(),
        });
        Ok(())
    }

    fn is_clean(&self) -> Result<bool, GraphError> {
        self.inner.is_clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::InMemoryGraph;
    use crate::topbase;
    use crate::ui::output::Verbosity;

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn move_is_recorded_not_performed() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        let a = graph.commit(Some(&root), "a", "+a\n");
        graph.branch("master", &root);
        graph.branch("new_branch", &a);

        let dry = DryRunGraph::new(&graph);
        let outcome = topbase::topbase(
            &dry,
            Verbosity::Quiet,
            &branch("new_branch"),
            &branch("master"),
        )
        .unwrap();

        assert!(outcome.fast_forwarded);
        assert_eq!(dry.planned_moves().len(), 1);
        assert_eq!(dry.planned_moves()[0].new_tip, a);
        // The real branch never moved.
        assert_eq!(graph.branch_tip(&branch("master")).unwrap(), root);
        assert!(graph.recorded_moves().is_empty());
    }
}
