// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree merge engine.
//!
//! Worktree paths live strictly inside the project repo root; both
//! sides are canonicalized before the containment check. Merges run on
//! the target branch with `--no-ff --no-edit`, restore HEAD whatever
//! happens, and hand conflicts back to a coder session.

use crate::error::EngineError;
use crate::hub::EventHub;
use crate::sessions::SessionManager;
use fm_adapters::{GitPorcelain, MuxGateway};
use fm_core::{
    slug_segment, Clock, IdGen, ProjectEvent, ProjectEventKind, ProjectId, SessionId,
    SessionStatus, TaskId, TaskStatus, Worktree, WorktreeId, WorktreeStatus,
};
use fm_storage::Store;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Component, Path};

/// Default resolver prompt sent to the coder session on conflict handoff.
const RESOLVER_MESSAGE: &str = "Please resolve merge conflicts in this worktree, commit the \
result, and finish with [READY_FOR_REVIEW].";

/// Outcome status of a merge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStatus {
    Merged,
    Conflict,
    Unchanged,
}

/// Result of a merge attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub status: MergeStatus,
    pub merged: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflict_files: Vec<String>,
}

/// Worktree merge engine over the store and the git porcelain.
pub struct WorktreeEngine<C: Clock, I: IdGen> {
    store: Store,
    hub: EventHub,
    git: GitPorcelain,
    clock: C,
    ids: I,
}

impl<C: Clock, I: IdGen> Clone for WorktreeEngine<C, I> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            hub: self.hub.clone(),
            git: self.git.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
        }
    }
}

/// Sanitize a branch name: lower-case, `[a-z0-9._-]` per segment,
/// slash-separated segments, empties dropped.
pub fn sanitize_branch(name: &str) -> Option<String> {
    let segments: Vec<String> = name
        .split('/')
        .map(|segment| {
            let mut out = String::new();
            let mut last_dash = false;
            for ch in segment.to_lowercase().chars() {
                if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '.' || ch == '_' {
                    out.push(ch);
                    last_dash = false;
                } else if !last_dash {
                    // '-' and every other character collapse to one dash
                    out.push('-');
                    last_dash = true;
                }
            }
            out.trim_matches('-').to_string()
        })
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Reject `..` escapes before any filesystem resolution.
fn has_parent_escape(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::ParentDir))
}

impl<C: Clock, I: IdGen> WorktreeEngine<C, I> {
    pub fn new(store: Store, hub: EventHub, git: GitPorcelain, clock: C, ids: I) -> Self {
        Self {
            store,
            hub,
            git,
            clock,
            ids,
        }
    }

    fn worktree(&self, id: &WorktreeId) -> Result<Worktree, EngineError> {
        self.store
            .with(|state| state.worktree(id).cloned())
            .ok_or_else(|| EngineError::not_found(format!("no such worktree: {}", id)))
    }

    /// Create a worktree on a new branch, path contained in the repo.
    pub async fn create(
        &self,
        project_id: &ProjectId,
        task_id: Option<&TaskId>,
        branch_name: &str,
        path: Option<&Path>,
    ) -> Result<Worktree, EngineError> {
        let project = self
            .store
            .with(|state| state.project(project_id).cloned())
            .ok_or_else(|| EngineError::not_found(format!("no such project: {}", project_id)))?;

        if let Some(task_id) = task_id {
            self.store
                .with(|state| state.task(task_id).cloned())
                .ok_or_else(|| EngineError::not_found(format!("no such task: {}", task_id)))?;
        }

        let branch = sanitize_branch(branch_name)
            .ok_or_else(|| EngineError::invalid(format!("unusable branch name: {:?}", branch_name)))?;

        let repo_root = project
            .repo_path
            .canonicalize()
            .map_err(|e| EngineError::invalid(format!("repo path unresolvable: {}", e)))?;

        let target = match path {
            Some(path) => {
                if !path.is_absolute() {
                    return Err(EngineError::invalid("worktree path must be absolute"));
                }
                if has_parent_escape(path) {
                    return Err(EngineError::invalid("worktree path may not contain .."));
                }
                path.to_path_buf()
            }
            None => {
                let leaf = task_id
                    .map(|t| slug_segment(t.as_str(), 36))
                    .unwrap_or_else(|| slug_segment(&branch, 36));
                repo_root.join(".worktrees").join(leaf)
            }
        };

        // Create the parent so canonicalization has something to chew on
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::Storage(format!("create worktree parent: {}", e)))?;
        }
        let canonical_parent = target
            .parent()
            .and_then(|p| p.canonicalize().ok())
            .ok_or_else(|| EngineError::invalid("worktree parent unresolvable"))?;
        let canonical_target = canonical_parent.join(
            target
                .file_name()
                .ok_or_else(|| EngineError::invalid("worktree path has no leaf"))?,
        );

        if !canonical_target.starts_with(&repo_root) || canonical_target == repo_root {
            return Err(EngineError::invalid(format!(
                "worktree path escapes the repo root: {}",
                canonical_target.display()
            )));
        }

        self.git
            .worktree_add(&repo_root, &canonical_target, &branch)
            .await?;

        let worktree = Worktree {
            id: WorktreeId::new(self.ids.next()),
            project_id: project_id.clone(),
            task_id: task_id.cloned(),
            branch_name: branch,
            path: canonical_target,
            status: WorktreeStatus::Active,
            created_at_ms: self.clock.epoch_ms(),
        };

        self.store.with(|state| {
            state.upsert_worktree(worktree.clone());
            if let Some(task_id) = task_id {
                if let Some(task) = state.task(task_id) {
                    let mut task = task.clone();
                    task.worktree_id = Some(worktree.id.clone());
                    state.upsert_task(task);
                }
            }
        });

        Ok(worktree)
    }

    /// Merge the worktree's branch into the target branch.
    ///
    /// Already-an-ancestor short-circuits as `unchanged` without
    /// touching HEAD. Otherwise the target branch is checked out, the
    /// merge attempted with a merge commit, conflicts collected and
    /// aborted, and the original HEAD restored on every path.
    pub async fn merge(
        &self,
        worktree_id: &WorktreeId,
        target_branch: Option<&str>,
    ) -> Result<MergeOutcome, EngineError> {
        let worktree = self.worktree(worktree_id)?;
        let project = self
            .store
            .with(|state| state.project(&worktree.project_id).cloned())
            .ok_or_else(|| {
                EngineError::not_found(format!("no such project: {}", worktree.project_id))
            })?;
        let repo = project.repo_path.clone();

        let target = match target_branch {
            Some(branch) => branch.to_string(),
            None => self.git.default_branch(&repo).await?,
        };
        let source_commit = self.git.rev_parse(&repo, &worktree.branch_name).await?;

        // Idempotence: nothing to do when the source is already merged
        if self.git.is_ancestor(&repo, &source_commit, &target).await? {
            self.mark_merged(&worktree);
            return Ok(MergeOutcome {
                status: MergeStatus::Unchanged,
                merged: true,
                conflict_files: Vec::new(),
            });
        }

        let original_head = self.git.current_head(&repo).await?;
        self.git.checkout(&repo, &target).await?;

        let merge_result = self.git.merge_no_ff(&repo, &worktree.branch_name).await;
        let outcome = match merge_result {
            Ok(true) => {
                self.restore_head(&repo, &original_head, &target).await;
                self.mark_merged(&worktree);
                Ok(MergeOutcome {
                    status: MergeStatus::Merged,
                    merged: true,
                    conflict_files: Vec::new(),
                })
            }
            Ok(false) => {
                let conflict_files = self.git.unmerged_files(&repo).await.unwrap_or_default();
                if let Err(e) = self.git.merge_abort(&repo).await {
                    tracing::warn!(error = %e, "merge abort failed");
                }
                self.restore_head(&repo, &original_head, &target).await;
                self.mark_conflict(&worktree, &conflict_files);
                Ok(MergeOutcome {
                    status: MergeStatus::Conflict,
                    merged: false,
                    conflict_files,
                })
            }
            Err(e) => {
                self.restore_head(&repo, &original_head, &target).await;
                Err(EngineError::Git(e))
            }
        };

        outcome
    }

    async fn restore_head(&self, repo: &Path, original: &str, target: &str) {
        if original == target {
            return;
        }
        if let Err(e) = self.git.checkout(repo, original).await {
            tracing::error!(original, error = %e, "failed to restore HEAD");
        }
    }

    fn mark_merged(&self, worktree: &Worktree) {
        let already = worktree.status == WorktreeStatus::Merged;
        self.store.with(|state| {
            if let Some(wt) = state.worktree(&worktree.id) {
                let mut wt = wt.clone();
                wt.status = WorktreeStatus::Merged;
                state.upsert_worktree(wt);
            }
        });
        if !already {
            self.hub.publish_project(ProjectEvent::new(
                worktree.project_id.clone(),
                ProjectEventKind::WorktreeMergeSucceeded,
                json!({
                    "worktree_id": worktree.id,
                    "branch": worktree.branch_name,
                }),
            ));
        }
    }

    fn mark_conflict(&self, worktree: &Worktree, conflict_files: &[String]) {
        self.store.with(|state| {
            if let Some(wt) = state.worktree(&worktree.id) {
                let mut wt = wt.clone();
                wt.status = WorktreeStatus::Conflict;
                state.upsert_worktree(wt);
            }
            // The task goes back to the queue for rework
            if let Some(task_id) = &worktree.task_id {
                if let Some(task) = state.task(task_id) {
                    let mut task = task.clone();
                    task.status = TaskStatus::Pending;
                    state.upsert_task(task);
                }
            }
        });
        self.hub.publish_project(ProjectEvent::new(
            worktree.project_id.clone(),
            ProjectEventKind::WorktreeMergeConflict,
            json!({
                "worktree_id": worktree.id,
                "branch": worktree.branch_name,
                "conflict_files": conflict_files,
            }),
        ));
    }

    /// Hand a conflicted worktree to a coder session for resolution.
    ///
    /// Picks an active coder session for the worktree's task when none
    /// is given (any coder session as fallback), resets the worktree
    /// and task, and sends the resolver prompt.
    pub async fn resolve_conflict_handoff<G: MuxGateway>(
        &self,
        worktree_id: &WorktreeId,
        session_id: Option<&SessionId>,
        message: Option<&str>,
        sessions: &SessionManager<G, C, I>,
    ) -> Result<Option<SessionId>, EngineError> {
        let worktree = self.worktree(worktree_id)?;

        let chosen = match session_id {
            Some(id) => Some(id.clone()),
            None => self.store.with(|state| {
                let task_sessions = worktree
                    .task_id
                    .as_ref()
                    .map(|t| state.sessions_for_task(t))
                    .unwrap_or_default();
                let coders: Vec<_> = task_sessions
                    .iter()
                    .filter(|s| s.role == "coder" && !s.status.is_terminal())
                    .collect();
                coders
                    .iter()
                    .find(|s| {
                        matches!(
                            s.status,
                            SessionStatus::Running | SessionStatus::Working | SessionStatus::Idle
                        )
                    })
                    .or_else(|| coders.first())
                    .map(|s| s.id.clone())
            }),
        };

        self.store.with(|state| {
            if let Some(wt) = state.worktree(worktree_id) {
                let mut wt = wt.clone();
                wt.status = WorktreeStatus::Active;
                state.upsert_worktree(wt);
            }
            if let Some(task_id) = &worktree.task_id {
                if let Some(task) = state.task(task_id) {
                    let mut task = task.clone();
                    task.status = TaskStatus::Pending;
                    state.upsert_task(task);
                }
            }
        });

        if let Some(session_id) = &chosen {
            let text = format!("{}\n", message.unwrap_or(RESOLVER_MESSAGE));
            sessions.send_text(session_id, &text).await?;
        }

        self.hub.publish_project(ProjectEvent::new(
            worktree.project_id.clone(),
            ProjectEventKind::WorktreeConflictResolutionRequested,
            json!({
                "worktree_id": worktree.id,
                "session_id": chosen,
            }),
        ));

        Ok(chosen)
    }

    /// Delete a worktree record (and checkout), clearing task links.
    pub async fn remove(&self, worktree_id: &WorktreeId) -> Result<(), EngineError> {
        let worktree = self.worktree(worktree_id)?;
        let repo = self
            .store
            .with(|state| state.project(&worktree.project_id).map(|p| p.repo_path.clone()))
            .ok_or_else(|| {
                EngineError::not_found(format!("no such project: {}", worktree.project_id))
            })?;

        if let Err(e) = self.git.worktree_remove(&repo, &worktree.path).await {
            tracing::warn!(error = %e, "worktree checkout removal failed, dropping record anyway");
        }
        self.store.with(|state| state.remove_worktree(worktree_id));
        Ok(())
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
