// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run records: a project's pass through plan → build → test.
//!
//! At most one run per project is active at a time, and a run's current
//! stage never moves backwards.

use crate::project::ProjectId;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a run.
    pub struct RunId;
}

/// Status of a run or of one of its stage records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Active,
    Completed,
    Failed,
    Blocked,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Active => write!(f, "active"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// One lifecycle pass for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub project_id: ProjectId,
    pub current_stage: Stage,
    pub status: RunStatus,
    #[serde(default)]
    pub created_at_ms: u64,
}

/// Per-stage record within a run, with transition evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRun {
    pub run_id: RunId,
    pub stage: Stage,
    pub status: RunStatus,
    /// Free-form JSON recorded at the transition.
    #[serde(default)]
    pub evidence: serde_json::Value,
    #[serde(default)]
    pub updated_at_ms: u64,
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
