//! topbase::replay
//!
//! Fast-forward detection and commit replay.
//!
//! # Fast-forward
//!
//! When the fork point is the target's current tip and no merge commit
//! sat anywhere between the fork point and the source tip, reconciliation
//! reduces to a pointer move: the target is rebound to the source tip and
//! every commit keeps its original hash. A merge in the range disqualifies
//! fast-forward even where a literal git fast-forward would be
//! topologically valid, because merge commits must never propagate into
//! the target's final history.
//!
//! # Replay
//!
//! Otherwise each series commit is cherry-picked oldest-first onto the
//! growing tip. Commits are created ref-less; a conflict aborts the whole
//! operation with the target ref untouched, identifying the offending
//! commit.

use crate::core::types::Oid;
use crate::graph::{CommitGraph, GraphError};

use super::fork::ForkPoint;
use super::series::CommitSeries;
use super::ReconcileError;

/// Check whether reconciliation reduces to a pointer move.
///
/// Returns the new target tip (the source tip, unchanged) when:
/// - the resolved fork point is the target's current tip, and
/// - the series is exactly the source branch's tail: no merge was
///   omitted between fork point and source tip, and the series ends at
///   the source tip itself.
pub fn try_fast_forward(
    series: &CommitSeries,
    fork: &ForkPoint,
    source_tip: &Oid,
    target_tip: &Oid,
) -> Option<Oid> {
    if fork != &ForkPoint::Commit(target_tip.clone()) {
        return None;
    }
    if series.has_skipped_merges() {
        return None;
    }
    // The series must reach the source tip; a rewritten twin of the
    // target tip at the series base would mean the hashes differ below.
    match series.newest() {
        Some(newest) if newest.oid == *source_tip => Some(source_tip.clone()),
        _ => None,
    }
}

/// Replay a series atop `target_tip`, oldest first.
///
/// Returns the final tip and the number of commits actually created.
/// Empty cherry-picks (changes already present on the target line) are
/// skipped rather than preserved as empty commits.
///
/// # Errors
///
/// [`ReconcileError::Conflict`] identifying the offending commit; no ref
/// has been touched when it surfaces.
pub fn replay<G: CommitGraph + ?Sized>(
    graph: &G,
    series: &CommitSeries,
    target_tip: &Oid,
) -> Result<(Oid, usize), ReconcileError> {
    let mut tip = target_tip.clone();
    let mut created = 0;

    for meta in series.commits() {
        match graph.cherry_pick(&meta.oid, &tip) {
            Ok(Some(new_tip)) => {
                tip = new_tip;
                created += 1;
            }
            Ok(None) => {} // change already present, skip
            Err(GraphError::Conflict { commit }) => {
                return Err(ReconcileError::Conflict {
                    commit,
                    summary: meta.summary.clone(),
                });
            }
            Err(other) => return Err(other.into()),
        }
    }

    Ok((tip, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BranchName;
    use crate::graph::mock::InMemoryGraph;
    use crate::topbase::series::build_series;

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    /// Linear branch: root <- base <- x <- y, branch tip at y.
    fn linear_fixture(graph: &InMemoryGraph) -> (Oid, Oid, Oid, Oid) {
        let root = graph.commit(None, "init", "+init\n");
        let base = graph.commit(Some(&root), "base", "+base\n");
        let x = graph.commit(Some(&base), "x", "+x\n");
        let y = graph.commit(Some(&x), "y", "+y\n");
        graph.branch("feature", &y);
        (root, base, x, y)
    }

    #[test]
    fn fast_forward_applies_to_clean_tail() {
        let graph = InMemoryGraph::new();
        let (_root, base, _x, y) = linear_fixture(&graph);

        let series = build_series(&graph, &branch("feature"), Some(&base)).unwrap();
        let fork = ForkPoint::Commit(base.clone());

        assert_eq!(try_fast_forward(&series, &fork, &y, &base), Some(y));
    }

    #[test]
    fn fast_forward_refused_when_fork_is_not_target_tip() {
        let graph = InMemoryGraph::new();
        let (root, base, _x, y) = linear_fixture(&graph);

        let series = build_series(&graph, &branch("feature"), Some(&base)).unwrap();
        let fork = ForkPoint::Commit(base);

        // Target tip advanced past the fork point.
        assert_eq!(try_fast_forward(&series, &fork, &y, &root), None);
    }

    #[test]
    fn fast_forward_refused_when_merge_was_skipped() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        let base = graph.commit(Some(&root), "base", "+base\n");
        let side = graph.commit(Some(&base), "side", "+side\n");
        let a = graph.commit(Some(&base), "a", "+a\n");
        let m = graph.merge(&a, &side, "merge side");
        let b = graph.commit(Some(&m), "b", "+b\n");
        graph.branch("feature", &b);

        let series = build_series(&graph, &branch("feature"), Some(&base)).unwrap();
        let fork = ForkPoint::Commit(base.clone());

        // A literal git fast-forward would be valid here; refused anyway.
        assert_eq!(try_fast_forward(&series, &fork, &b, &base), None);
    }

    #[test]
    fn fast_forward_refused_for_root_fork() {
        let graph = InMemoryGraph::new();
        let (_root, base, _x, y) = linear_fixture(&graph);

        let series = build_series(&graph, &branch("feature"), None).unwrap();
        assert_eq!(try_fast_forward(&series, &ForkPoint::Root, &y, &base), None);
    }

    #[test]
    fn replay_builds_linear_chain_with_new_hashes() {
        let graph = InMemoryGraph::new();
        let (_root, base, x, y) = linear_fixture(&graph);

        // Independent target line.
        let t_root = graph.commit(None, "other init", "+other\n");

        let series = build_series(&graph, &branch("feature"), Some(&base)).unwrap();
        let (tip, created) = replay(&graph, &series, &t_root).unwrap();

        assert_eq!(created, 2);
        assert_ne!(tip, y);
        // Chain: tip -> picked(x) -> t_root, all single-parent.
        assert_eq!(graph.summary_of(&tip), "y");
        let parent = &graph.parents_of(&tip)[0];
        assert_eq!(graph.summary_of(parent), "x");
        assert_eq!(graph.parents_of(parent), vec![t_root]);
        assert_ne!(*parent, x);
    }

    #[test]
    fn replay_skips_changes_already_present() {
        let graph = InMemoryGraph::new();
        let (_root, base, _x, _y) = linear_fixture(&graph);

        // Target already carries x's change under another identity.
        let t_root = graph.commit(None, "other init", "+other\n");
        let t_x = graph.commit(Some(&t_root), "x elsewhere", "+x\n");

        let series = build_series(&graph, &branch("feature"), Some(&base)).unwrap();
        let (tip, created) = replay(&graph, &series, &t_x).unwrap();

        assert_eq!(created, 1);
        assert_eq!(graph.summary_of(&tip), "y");
    }

    #[test]
    fn replay_conflict_identifies_offending_commit() {
        let graph = InMemoryGraph::new();
        let (_root, base, x, _y) = linear_fixture(&graph);
        let t_root = graph.commit(None, "other init", "+other\n");
        graph.fail_pick_on(&x);

        let series = build_series(&graph, &branch("feature"), Some(&base)).unwrap();
        let err = replay(&graph, &series, &t_root).unwrap_err();

        match err {
            ReconcileError::Conflict { commit, summary } => {
                assert_eq!(commit, x);
                assert_eq!(summary, "x");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn replay_of_empty_series_is_identity() {
        let graph = InMemoryGraph::new();
        let root = graph.commit(None, "init", "+init\n");
        graph.branch("feature", &root);

        let series = build_series(&graph, &branch("feature"), Some(&root)).unwrap();
        let (tip, created) = replay(&graph, &series, &root).unwrap();
        assert_eq!(tip, root);
        assert_eq!(created, 0);
    }
}
