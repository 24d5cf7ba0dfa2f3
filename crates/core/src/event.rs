// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types flowing through the hub to connected clients.

use crate::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a project-scoped event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectEventKind {
    StageState,
    ReviewIterationCompleted,
    ReviewLoopPassed,
    ProjectBlocked,
    ProjectPhaseChanged,
    WorktreeMergeSucceeded,
    WorktreeMergeConflict,
    WorktreeConflictResolutionRequested,
}

impl ProjectEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectEventKind::StageState => "stage_state",
            ProjectEventKind::ReviewIterationCompleted => "review_iteration_completed",
            ProjectEventKind::ReviewLoopPassed => "review_loop_passed",
            ProjectEventKind::ProjectBlocked => "project_blocked",
            ProjectEventKind::ProjectPhaseChanged => "project_phase_changed",
            ProjectEventKind::WorktreeMergeSucceeded => "worktree_merge_succeeded",
            ProjectEventKind::WorktreeMergeConflict => "worktree_merge_conflict",
            ProjectEventKind::WorktreeConflictResolutionRequested => {
                "worktree_conflict_resolution_requested"
            }
        }
    }
}

impl fmt::Display for ProjectEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project-scoped event published on run/review/worktree transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEvent {
    pub project_id: ProjectId,
    pub kind: ProjectEventKind,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ProjectEvent {
    pub fn new(project_id: ProjectId, kind: ProjectEventKind, payload: serde_json::Value) -> Self {
        Self {
            project_id,
            kind,
            payload,
        }
    }
}

/// One captured terminal line addressed by multiplexer window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalFrame {
    pub window_id: String,
    pub text: String,
    pub timestamp_us: u64,
}

/// Structured events streamed from one orchestrator chat call.
///
/// Serializes with `{"type": "...", ...fields}`; the daemon forwards
/// these verbatim to subscribed clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Assistant natural-language chunk.
    Token { text: String },
    /// LLM-initiated tool invocation.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Outcome of a tool invocation.
    ToolResult {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Loop concluded cleanly.
    Done,
    /// Fatal; the stream closes after this event.
    Error { error: String },
}

impl StreamEvent {
    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
