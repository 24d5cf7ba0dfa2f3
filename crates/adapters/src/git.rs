// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git porcelain adapter for worktree and merge operations.
//!
//! The engine treats git as an external porcelain: every operation is a
//! subprocess invocation against a repository directory. Nothing here
//! inspects the object store.

use crate::subprocess::{run_with_timeout, GIT_TIMEOUT};
use std::path::Path;
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;

/// Errors from git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {op} failed: {stderr}")]
    Failed { op: String, stderr: String },
    #[error("git unavailable: {0}")]
    Unavailable(String),
}

/// Subprocess-backed git porcelain.
#[derive(Clone, Default)]
pub struct GitPorcelain;

impl GitPorcelain {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, repo: &Path, args: &[&str]) -> Result<Output, GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(repo).args(args);
        run_with_timeout(cmd, GIT_TIMEOUT, "git")
            .await
            .map_err(GitError::Unavailable)
    }

    async fn run_ok(&self, repo: &Path, args: &[&str]) -> Result<Output, GitError> {
        let output = self.run(repo, args).await?;
        if !output.status.success() {
            return Err(GitError::Failed {
                op: args.first().copied().unwrap_or("?").to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    fn stdout_line(output: &Output) -> String {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Resolve a revision to a commit hash.
    pub async fn rev_parse(&self, repo: &Path, rev: &str) -> Result<String, GitError> {
        let output = self.run_ok(repo, &["rev-parse", "--verify", rev]).await?;
        Ok(Self::stdout_line(&output))
    }

    /// The branch HEAD points at, or the bare commit when detached.
    pub async fn current_head(&self, repo: &Path) -> Result<String, GitError> {
        let output = self
            .run(repo, &["symbolic-ref", "--quiet", "--short", "HEAD"])
            .await?;
        if output.status.success() {
            return Ok(Self::stdout_line(&output));
        }
        self.rev_parse(repo, "HEAD").await
    }

    /// The repository's default branch.
    ///
    /// Prefers the origin HEAD mapping when present, otherwise probes
    /// `main` then `master`.
    pub async fn default_branch(&self, repo: &Path) -> Result<String, GitError> {
        let output = self
            .run(repo, &["symbolic-ref", "--quiet", "--short", "refs/remotes/origin/HEAD"])
            .await?;
        if output.status.success() {
            let name = Self::stdout_line(&output);
            if let Some(stripped) = name.strip_prefix("origin/") {
                return Ok(stripped.to_string());
            }
            return Ok(name);
        }

        for candidate in ["main", "master"] {
            let probe = self
                .run(
                    repo,
                    &["show-ref", "--verify", "--quiet", &format!("refs/heads/{}", candidate)],
                )
                .await?;
            if probe.status.success() {
                return Ok(candidate.to_string());
            }
        }

        // Fall back to wherever HEAD points
        self.current_head(repo).await
    }

    /// Whether `ancestor` is already contained in `descendant`.
    pub async fn is_ancestor(
        &self,
        repo: &Path,
        ancestor: &str,
        descendant: &str,
    ) -> Result<bool, GitError> {
        let output = self
            .run(repo, &["merge-base", "--is-ancestor", ancestor, descendant])
            .await?;
        Ok(output.status.success())
    }

    pub async fn checkout(&self, repo: &Path, rev: &str) -> Result<(), GitError> {
        self.run_ok(repo, &["checkout", "--quiet", rev]).await?;
        Ok(())
    }

    /// Add a worktree at `path` on a new branch.
    pub async fn worktree_add(
        &self,
        repo: &Path,
        path: &Path,
        branch: &str,
    ) -> Result<(), GitError> {
        let path_str = path.to_string_lossy();
        self.run_ok(repo, &["worktree", "add", "-b", branch, &path_str])
            .await?;
        Ok(())
    }

    /// Remove a worktree checkout.
    pub async fn worktree_remove(&self, repo: &Path, path: &Path) -> Result<(), GitError> {
        let path_str = path.to_string_lossy();
        self.run_ok(repo, &["worktree", "remove", "--force", &path_str])
            .await?;
        Ok(())
    }

    /// Merge `branch` into the current HEAD with a merge commit.
    ///
    /// Returns `false` when the merge command fails (conflicts); the
    /// caller collects the unmerged files and aborts.
    pub async fn merge_no_ff(&self, repo: &Path, branch: &str) -> Result<bool, GitError> {
        let output = self
            .run(repo, &["merge", "--no-ff", "--no-edit", branch])
            .await?;
        Ok(output.status.success())
    }

    /// Paths with unresolved merge conflicts.
    pub async fn unmerged_files(&self, repo: &Path) -> Result<Vec<String>, GitError> {
        let output = self
            .run_ok(repo, &["diff", "--name-only", "--diff-filter=U"])
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(str::to_string).collect())
    }

    pub async fn merge_abort(&self, repo: &Path) -> Result<(), GitError> {
        self.run_ok(repo, &["merge", "--abort"]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
