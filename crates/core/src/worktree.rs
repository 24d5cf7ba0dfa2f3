// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree record: a linked checkout on its own branch.
//!
//! A worktree path must lie strictly inside its project's repo root;
//! the merge engine canonicalizes both sides before accepting one.

use crate::project::ProjectId;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a worktree.
    pub struct WorktreeId;
}

/// Lifecycle status of a worktree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorktreeStatus {
    Active,
    Merged,
    Conflict,
}

impl fmt::Display for WorktreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorktreeStatus::Active => write!(f, "active"),
            WorktreeStatus::Merged => write!(f, "merged"),
            WorktreeStatus::Conflict => write!(f, "conflict"),
        }
    }
}

/// A linked git checkout owned by a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worktree {
    pub id: WorktreeId,
    pub project_id: ProjectId,
    /// Task this worktree was created for, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub branch_name: String,
    /// Canonicalized path, always inside the project repo root.
    pub path: PathBuf,
    pub status: WorktreeStatus,
    #[serde(default)]
    pub created_at_ms: u64,
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
