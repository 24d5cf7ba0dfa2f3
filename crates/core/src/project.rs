// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project record: the root of ownership.
//!
//! A project owns its tasks, worktrees, agent sessions, review cycles,
//! runs, knowledge entries, orchestrator history and profile. Everything
//! else references a project by ID only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a project.
    pub struct ProjectId;
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Paused,
    Archived,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::Paused => write!(f, "paused"),
            ProjectStatus::Archived => write!(f, "archived"),
        }
    }
}

/// A project under orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Absolute path to the project's git repository root.
    pub repo_path: PathBuf,
    pub status: ProjectStatus,
    /// Playbook governing agent types and role contracts, if bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playbook_id: Option<String>,
    /// Epoch milliseconds when the project was created.
    #[serde(default)]
    pub created_at_ms: u64,
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
