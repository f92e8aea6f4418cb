//! reconcile command - run the topbase/rebase pipeline against a real
//! repository and report the outcome.

use anyhow::{anyhow, Context as _, Result};

use crate::cli::args::Cli;
use crate::core::types::BranchName;
use crate::git::Git;
use crate::graph::dry_run::DryRunGraph;
use crate::graph::CommitGraph;
use crate::topbase::{self, ReconcileOutcome};
use crate::ui::output::{self, Verbosity};

/// Run reconciliation per the parsed CLI flags.
pub fn run(cli: &Cli) -> Result<()> {
    let cwd = cli
        .cwd
        .clone()
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)
        .context("Failed to determine working directory")?;

    let git = Git::open(&cwd).context("Failed to open repository")?;
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    let source = BranchName::new(&cli.source).context("Invalid source branch name")?;
    let target = match &cli.target {
        Some(name) => BranchName::new(name).context("Invalid target branch name")?,
        None => git
            .current_branch()?
            .ok_or_else(|| anyhow!("Not on any branch and no target specified"))?,
    };
    let onto = cli
        .onto
        .as_deref()
        .map(BranchName::new)
        .transpose()
        .context("Invalid --onto branch name")?;

    if cli.dry_run {
        let dry = DryRunGraph::new(&git);
        let outcome = reconcile(&dry, verbosity, cli, &source, &target, onto.as_ref())?;
        report(cli, verbosity, &source, &target, &outcome)?;
        for planned in dry.planned_moves() {
            output::print(
                format!(
                    "would move '{}' from {} to {}",
                    planned.branch,
                    planned.old_tip.short(7),
                    planned.new_tip.short(7)
                ),
                verbosity,
            );
        }
        return Ok(());
    }

    let outcome = reconcile(&git, verbosity, cli, &source, &target, onto.as_ref())?;
    report(cli, verbosity, &source, &target, &outcome)
}

fn reconcile<G: CommitGraph + ?Sized>(
    graph: &G,
    verbosity: Verbosity,
    cli: &Cli,
    source: &BranchName,
    target: &BranchName,
    onto: Option<&BranchName>,
) -> Result<ReconcileOutcome> {
    let outcome = if cli.rebase || onto.is_some() {
        topbase::rebase(graph, verbosity, source, target, onto)?
    } else {
        topbase::topbase(graph, verbosity, source, target)?
    };
    Ok(outcome)
}

fn report(
    cli: &Cli,
    verbosity: Verbosity,
    source: &BranchName,
    target: &BranchName,
    outcome: &ReconcileOutcome,
) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if outcome.fast_forwarded {
        output::print(
            format!(
                "Fast-forwarded '{}' to {} (hashes preserved from '{}')",
                target,
                outcome.new_tip.short(7),
                source
            ),
            verbosity,
        );
    } else if outcome.commits_replayed > 0 {
        output::print(
            format!(
                "Replayed {} commit(s) from '{}'; '{}' is now at {}",
                outcome.commits_replayed,
                source,
                target,
                outcome.new_tip.short(7)
            ),
            verbosity,
        );
    } else {
        output::print(
            format!("'{}' is already up to date with '{}'", target, source),
            verbosity,
        );
    }

    Ok(())
}
