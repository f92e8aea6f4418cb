//! git::interface
//!
//! git2-backed implementation of the commit graph accessor.
//!
//! # Error Handling
//!
//! Opening failures get their own typed variants ([`GitError::NotARepo`],
//! [`GitError::BareRepo`]). Everything after open is reported through
//! [`GraphError`], the error domain of the accessor trait.
//!
//! # Example
//!
//! ```ignore
//! use topbase::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let tip = git.branch_tip(&BranchName::new("master")?)?;
//! println!("master is at {}", tip.short(7));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid};
use crate::graph::{CommitGraph, CommitMeta, GraphError};

/// Errors from opening a repository.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,
}

/// The Git accessor.
///
/// Wraps a `git2::Repository` and exposes exactly the operations the
/// reconciliation pipeline consumes. The working tree and index are
/// exclusively owned by the running invocation; replay never writes to
/// either (cherry-picks happen in memory and commits are created
/// ref-less).
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

/// Map a git2 error to the accessor error domain.
fn internal(err: git2::Error) -> GraphError {
    GraphError::Internal {
        message: err.message().to_string(),
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Get the current branch name, if HEAD is on a branch.
    ///
    /// Returns `None` for detached or unborn HEAD. Used by the CLI to
    /// default the target branch.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GraphError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(internal(e)),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None)
    }

    /// Find a commit by validated OID.
    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GraphError> {
        let git_oid = git2::Oid::from_str(oid.as_str()).map_err(internal)?;
        self.repo
            .find_commit(git_oid)
            .map_err(|_| GraphError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    /// Build a [`CommitMeta`] from a git2 commit.
    fn meta_of(&self, commit: &git2::Commit<'_>) -> Result<CommitMeta, GraphError> {
        let mut parents = Vec::with_capacity(commit.parent_count());
        for parent_id in commit.parent_ids() {
            parents.push(Oid::new(parent_id.to_string())?);
        }

        let author = commit.author();
        let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH)
            .with_timezone(&chrono::Utc);

        Ok(CommitMeta {
            oid: Oid::new(commit.id().to_string())?,
            parents,
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time,
        })
    }
}

impl CommitGraph for Git {
    fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GraphError> {
        let found = self
            .repo
            .find_branch(branch.as_str(), git2::BranchType::Local)
            .map_err(|e| {
                if e.code() == git2::ErrorCode::NotFound {
                    GraphError::UnknownBranch {
                        branch: branch.to_string(),
                    }
                } else {
                    internal(e)
                }
            })?;

        let commit = found.get().peel_to_commit().map_err(internal)?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    fn list_commits(&self, branch: &BranchName) -> Result<Vec<CommitMeta>, GraphError> {
        let tip = self.branch_tip(branch)?;

        // Manual first-parent walk: parent(0) at each step. A revwalk with
        // topological sorting can interleave side-branch commits, which
        // would break the merge-free series contract.
        let mut out = Vec::new();
        let mut cursor = Some(self.find_commit(&tip)?);
        while let Some(commit) = cursor {
            let meta = self.meta_of(&commit)?;
            cursor = if commit.parent_count() > 0 {
                Some(commit.parent(0).map_err(internal)?)
            } else {
                None
            };
            out.push(meta);
        }

        Ok(out)
    }

    fn patch_text(&self, commit: &Oid) -> Result<Vec<u8>, GraphError> {
        let commit = self.find_commit(commit)?;

        if commit.parent_count() > 1 {
            return Err(GraphError::MergeCommit {
                oid: Oid::new(commit.id().to_string())?,
            });
        }

        let tree = commit.tree().map_err(internal)?;
        // Root commits diff against the empty tree.
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0).map_err(internal)?.tree().map_err(internal)?),
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(internal)?;

        // Serialize to unified patch bytes. Everything emitted here is
        // content-derived: paths, modes, hunks, and blob ids (themselves
        // content hashes). The commit hash, author, timestamp, and message
        // never appear, which is what makes the fingerprint stable across
        // history rewrites.
        let mut buf = Vec::new();
        diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => buf.push(line.origin() as u8),
                _ => {}
            }
            buf.extend_from_slice(line.content());
            true
        })
        .map_err(internal)?;

        Ok(buf)
    }

    fn cherry_pick(&self, commit: &Oid, onto: &Oid) -> Result<Option<Oid>, GraphError> {
        let source = self.find_commit(commit)?;
        let onto_commit = self.find_commit(onto)?;

        // In-memory three-way merge of the commit's change onto the new
        // parent. The working tree and index are never touched.
        let mut index = self
            .repo
            .cherrypick_commit(&source, &onto_commit, 0, None)
            .map_err(internal)?;

        if index.has_conflicts() {
            return Err(GraphError::Conflict {
                commit: commit.clone(),
            });
        }

        let tree_oid = index.write_tree_to(&self.repo).map_err(internal)?;

        // An unchanged tree means the change is already present on the
        // target line; the caller skips the commit.
        if tree_oid == onto_commit.tree_id() {
            return Ok(None);
        }

        let tree = self.repo.find_tree(tree_oid).map_err(internal)?;
        let author = source.author();
        let committer = source.committer();
        let message = source.message().unwrap_or("");

        // update_ref = None: the commit is created ref-less. The target
        // branch is published exactly once, by the orchestrator.
        let new_oid = self
            .repo
            .commit(None, &author, &committer, message, &tree, &[&onto_commit])
            .map_err(internal)?;

        Ok(Some(Oid::new(new_oid.to_string())?))
    }

    fn move_branch(
        &self,
        branch: &BranchName,
        new_tip: &Oid,
        expected_old: &Oid,
    ) -> Result<(), GraphError> {
        let refname = branch.refname();

        // CAS precondition: the branch must still point where it did when
        // the reconciliation scanned it.
        let current = self
            .repo
            .find_reference(&refname)
            .map_err(|e| {
                if e.code() == git2::ErrorCode::NotFound {
                    GraphError::UnknownBranch {
                        branch: branch.to_string(),
                    }
                } else {
                    internal(e)
                }
            })?
            .target()
            .ok_or_else(|| GraphError::Internal {
                message: format!("ref {refname} has no direct target"),
            })?;

        if current.to_string() != expected_old.as_str() {
            return Err(GraphError::RefMoved {
                branch: branch.to_string(),
                expected: expected_old.to_string(),
                actual: current.to_string(),
            });
        }

        let oid = git2::Oid::from_str(new_tip.as_str()).map_err(internal)?;
        self.repo
            .reference(&refname, oid, true, "topbase: reconcile")
            .map_err(internal)?;

        Ok(())
    }

    fn is_clean(&self) -> Result<bool, GraphError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts)).map_err(internal)?;

        for entry in statuses.iter() {
            let status = entry.status();
            if status.is_conflicted() {
                return Ok(false);
            }
            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                return Ok(false);
            }
            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                return Ok(false);
            }
            // Untracked files do not block reconciliation.
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_non_repository_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let git = Git::open(dir.path());
        assert!(matches!(git, Err(GitError::NotARepo { .. })));
    }

    #[test]
    fn error_display_formatting() {
        let err = GitError::NotARepo {
            path: PathBuf::from("/nowhere"),
        };
        assert!(err.to_string().contains("/nowhere"));
        assert!(GitError::BareRepo.to_string().contains("bare"));
    }
}
