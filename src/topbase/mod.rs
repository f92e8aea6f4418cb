//! topbase
//!
//! The reconciliation pipeline.
//!
//! # Pipeline
//!
//! ```text
//! precondition (clean tree)
//!   -> fork-point resolution (content fingerprints, not ancestry)
//!   -> series construction (merge-free, oldest first)
//!   -> fast-forward attempt (pointer move, hashes preserved)
//!   -> replay (cherry-picks onto the growing tip)
//!   -> publish (single CAS ref move)
//! ```
//!
//! # Invariants
//!
//! - The target branch ref is updated exactly once, at the very end,
//!   only on full success
//! - Every component fails fast back to the orchestrator; no local
//!   recovery, no partial mutation
//! - Reconciliation is idempotent: a second invocation with no
//!   intervening changes finds an empty series and is a no-op

pub mod fingerprint;
pub mod fork;
pub mod replay;
pub mod series;

pub use fork::ForkPoint;
pub use series::CommitSeries;

use serde::Serialize;
use thiserror::Error;

use crate::core::types::{BranchName, Oid};
use crate::graph::{CommitGraph, GraphError};
use crate::ui::output::{self, Verbosity};

/// Errors from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The working tree has local changes. Refused before any mutation;
    /// stash or commit first.
    #[error("working tree has modified files; stash or commit them first")]
    DirtyWorkingTree,

    /// One of the named branches does not exist.
    #[error("unknown branch: {branch}")]
    UnknownBranch {
        /// The branch that was not found
        branch: String,
    },

    /// A commit's change did not apply cleanly during replay.
    ///
    /// The target branch ref is untouched when this surfaces.
    #[error("conflict replaying {} ({summary}); target branch left unchanged", commit.short(7))]
    Conflict {
        /// The offending commit
        commit: Oid,
        /// Its message summary, for human-readable reporting
        summary: String,
    },

    /// Accessor failure.
    #[error(transparent)]
    Graph(GraphError),
}

impl From<GraphError> for ReconcileError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::UnknownBranch { branch } => ReconcileError::UnknownBranch { branch },
            other => ReconcileError::Graph(other),
        }
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    /// The target branch's new tip.
    pub new_tip: Oid,
    /// Number of commits newly created by replay (zero for a
    /// fast-forward or a no-op).
    pub commits_replayed: usize,
    /// Whether the reconciliation was a pure pointer move preserving
    /// original commit hashes.
    pub fast_forwarded: bool,
}

/// Reattach `source`'s unique commits onto `target`.
///
/// The fork point is found by content fingerprint, so a `source` whose
/// history was rewritten by filtering still reconciles against its
/// `target`. On success the target branch points at the new tip; on any
/// error it is untouched.
///
/// # Errors
///
/// See [`ReconcileError`]; every variant leaves the target unmodified.
pub fn topbase<G: CommitGraph + ?Sized>(
    graph: &G,
    verbosity: Verbosity,
    source: &BranchName,
    target: &BranchName,
) -> Result<ReconcileOutcome, ReconcileError> {
    reconcile(graph, verbosity, source, target, target)
}

/// Same pipeline as [`topbase`], with the replay base selectable.
///
/// The fork point is still resolved between `source` and `target`, but
/// the series is replayed atop `onto`'s tip (defaulting to `target`).
/// `target` is the branch that gets rebound.
pub fn rebase<G: CommitGraph + ?Sized>(
    graph: &G,
    verbosity: Verbosity,
    source: &BranchName,
    target: &BranchName,
    onto: Option<&BranchName>,
) -> Result<ReconcileOutcome, ReconcileError> {
    reconcile(graph, verbosity, source, target, onto.unwrap_or(target))
}

fn reconcile<G: CommitGraph + ?Sized>(
    graph: &G,
    verbosity: Verbosity,
    source: &BranchName,
    target: &BranchName,
    onto: &BranchName,
) -> Result<ReconcileOutcome, ReconcileError> {
    if !graph.is_clean()? {
        return Err(ReconcileError::DirtyWorkingTree);
    }

    let source_tip = graph.branch_tip(source)?;
    let target_tip = graph.branch_tip(target)?;
    let onto_tip = graph.branch_tip(onto)?;

    let fork = fork::resolve_fork_point(graph, source, target)?;
    if fork == ForkPoint::Root {
        output::warn(
            format!(
                "no common fork point between '{source}' and '{target}'; \
                 replaying the entire history of '{source}'"
            ),
            verbosity,
        );
    }

    let series = series::build_series(graph, source, fork.stop_at())?;
    output::debug(
        format!(
            "fork point {:?}, series of {} commit(s)",
            fork,
            series.len()
        ),
        verbosity,
    );

    // Nothing unique to the source: a no-op, including the repeated
    // invocation case.
    if series.is_empty() {
        return Ok(ReconcileOutcome {
            new_tip: target_tip,
            commits_replayed: 0,
            fast_forwarded: false,
        });
    }

    // Fast-forward only makes sense when replaying onto the target
    // itself; an explicit --onto always goes through the replay engine.
    if onto == target {
        if let Some(new_tip) = replay::try_fast_forward(&series, &fork, &source_tip, &target_tip) {
            graph.move_branch(target, &new_tip, &target_tip)?;
            return Ok(ReconcileOutcome {
                new_tip,
                commits_replayed: 0,
                fast_forwarded: true,
            });
        }
    }

    let (new_tip, commits_replayed) = replay::replay(graph, &series, &onto_tip)?;

    // Every pick was empty: the target already carries all the changes.
    if commits_replayed == 0 && new_tip == target_tip {
        return Ok(ReconcileOutcome {
            new_tip,
            commits_replayed: 0,
            fast_forwarded: false,
        });
    }

    graph.move_branch(target, &new_tip, &target_tip)?;
    Ok(ReconcileOutcome {
        new_tip,
        commits_replayed,
        fast_forwarded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::InMemoryGraph;

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    fn quiet() -> Verbosity {
        Verbosity::Quiet
    }

    /// master at base; new_branch adds commits on top of master's tip.
    fn ff_fixture(graph: &InMemoryGraph, extra: usize) -> (Oid, Vec<Oid>) {
        let root = graph.commit(None, "init", "+init\n");
        let base = graph.commit(Some(&root), "base", "+base\n");
        graph.branch("master", &base);

        let mut tips = Vec::new();
        let mut tip = base.clone();
        for i in 0..extra {
            tip = graph.commit(Some(&tip), &format!("c{i}"), &format!("+c{i}\n"));
            tips.push(tip.clone());
        }
        graph.branch("new_branch", &tip);
        (base, tips)
    }

    #[test]
    fn fast_forward_preserves_hashes() {
        let graph = InMemoryGraph::new();
        let (base, tips) = ff_fixture(&graph, 3);

        let outcome =
            topbase(&graph, quiet(), &branch("new_branch"), &branch("master")).unwrap();

        assert!(outcome.fast_forwarded);
        assert_eq!(outcome.commits_replayed, 0);
        assert_eq!(outcome.new_tip, *tips.last().unwrap());
        assert_eq!(graph.branch_tip(&branch("master")).unwrap(), outcome.new_tip);
        assert_ne!(graph.branch_tip(&branch("master")).unwrap(), base);
    }

    #[test]
    fn dirty_tree_is_refused_before_any_mutation() {
        let graph = InMemoryGraph::new();
        let (base, _) = ff_fixture(&graph, 1);
        graph.set_clean(false);

        let err = topbase(&graph, quiet(), &branch("new_branch"), &branch("master")).unwrap_err();
        assert!(matches!(err, ReconcileError::DirtyWorkingTree));
        assert_eq!(graph.branch_tip(&branch("master")).unwrap(), base);
        assert!(graph.recorded_moves().is_empty());
    }

    #[test]
    fn unknown_branch_is_reported_by_name() {
        let graph = InMemoryGraph::new();
        let (_, _) = ff_fixture(&graph, 1);

        let err = topbase(&graph, quiet(), &branch("missing"), &branch("master")).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::UnknownBranch { branch } if branch == "missing"
        ));
    }

    #[test]
    fn idempotent_second_invocation_is_a_noop() {
        let graph = InMemoryGraph::new();
        ff_fixture(&graph, 2);

        let first = topbase(&graph, quiet(), &branch("new_branch"), &branch("master")).unwrap();
        let second = topbase(&graph, quiet(), &branch("new_branch"), &branch("master")).unwrap();

        assert_eq!(second.new_tip, first.new_tip);
        assert_eq!(second.commits_replayed, 0);
        assert!(!second.fast_forwarded);
        // Only the first invocation moved the ref.
        assert_eq!(graph.recorded_moves().len(), 1);
    }

    #[test]
    fn identical_branches_are_a_noop() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        graph.branch("a", &root);
        graph.branch("b", &root);

        let outcome = topbase(&graph, quiet(), &branch("a"), &branch("b")).unwrap();
        assert_eq!(outcome.new_tip, root);
        assert_eq!(outcome.commits_replayed, 0);
        assert!(graph.recorded_moves().is_empty());
    }

    #[test]
    fn diverged_target_goes_through_replay() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        let base = graph.commit(Some(&root), "base", "+base\n");
        let s1 = graph.commit(Some(&base), "feature work", "+feature\n");
        graph.branch("new_branch", &s1);

        // master advanced independently after the fork.
        let t1 = graph.commit(Some(&base), "unrelated", "+unrelated\n");
        graph.branch("master", &t1);

        let outcome =
            topbase(&graph, quiet(), &branch("new_branch"), &branch("master")).unwrap();

        assert!(!outcome.fast_forwarded);
        assert_eq!(outcome.commits_replayed, 1);
        assert_ne!(outcome.new_tip, s1);
        assert_eq!(graph.summary_of(&outcome.new_tip), "feature work");
        assert_eq!(graph.parents_of(&outcome.new_tip), vec![t1]);
    }

    #[test]
    fn merge_in_range_forces_replay_and_is_excluded() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        let base = graph.commit(Some(&root), "base", "+base\n");
        graph.branch("master", &base);

        // new_branch: work, then a merge of throwaway tmp1, then more work.
        let w1 = graph.commit(Some(&base), "w1", "+w1\n");
        let tmp1 = graph.commit(Some(&base), "tmp1 work", "+tmp1\n");
        let m = graph.merge(&w1, &tmp1, "Merge branch 'tmp1'");
        let w2 = graph.commit(Some(&m), "w2", "+w2\n");
        graph.branch("new_branch", &w2);

        let outcome =
            topbase(&graph, quiet(), &branch("new_branch"), &branch("master")).unwrap();

        assert!(!outcome.fast_forwarded);
        assert_eq!(outcome.commits_replayed, 2);

        // Walk the rebuilt master history: linear, no merges, no trace
        // of the tmp1 merge.
        let commits = graph.list_commits(&branch("master")).unwrap();
        for meta in &commits {
            assert!(!meta.is_merge());
            assert!(!meta.message.contains("tmp1"));
        }
    }

    #[test]
    fn conflict_leaves_target_untouched() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        let base = graph.commit(Some(&root), "base", "+base\n");
        let s1 = graph.commit(Some(&base), "s1", "+s1\n");
        let s2 = graph.commit(Some(&s1), "s2", "+s2\n");
        graph.branch("new_branch", &s2);

        let t1 = graph.commit(Some(&base), "unrelated", "+unrelated\n");
        graph.branch("master", &t1);

        // Second pick conflicts after the first succeeded.
        graph.fail_pick_on(&s2);

        let err = topbase(&graph, quiet(), &branch("new_branch"), &branch("master")).unwrap_err();
        assert!(matches!(err, ReconcileError::Conflict { commit, .. } if commit == s2));
        assert_eq!(graph.branch_tip(&branch("master")).unwrap(), t1);
        assert!(graph.recorded_moves().is_empty());
    }

    #[test]
    fn rebase_onto_replays_atop_the_onto_branch() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        let base = graph.commit(Some(&root), "base", "+base\n");
        let s1 = graph.commit(Some(&base), "s1", "+s1\n");
        graph.branch("new_branch", &s1);
        graph.branch("master", &base);

        let o1 = graph.commit(Some(&base), "onto work", "+onto\n");
        graph.branch("staging", &o1);

        let outcome = rebase(
            &graph,
            quiet(),
            &branch("new_branch"),
            &branch("master"),
            Some(&branch("staging")),
        )
        .unwrap();

        // Replayed atop staging's tip, published to master.
        assert!(!outcome.fast_forwarded);
        assert_eq!(graph.parents_of(&outcome.new_tip), vec![o1]);
        assert_eq!(graph.branch_tip(&branch("master")).unwrap(), outcome.new_tip);
    }

    #[test]
    fn rebase_without_onto_matches_topbase() {
        let graph = InMemoryGraph::new();
        let (_, tips) = ff_fixture(&graph, 2);

        let outcome = rebase(
            &graph,
            quiet(),
            &branch("new_branch"),
            &branch("master"),
            None,
        )
        .unwrap();

        assert!(outcome.fast_forwarded);
        assert_eq!(outcome.new_tip, *tips.last().unwrap());
    }
}
