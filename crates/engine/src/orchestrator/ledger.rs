// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool invocation ledger and derived exceptions.
//!
//! The ledger is a bounded in-memory ring of recent tool calls.
//! Exceptions are a derived view: blocked stage-runs, failed ledger
//! entries, and assistant messages that tripped an approval phrase.
//! Resolution is an in-memory set keyed by project; nothing here is
//! persisted.

use fm_core::{HistoryRole, ProjectId, RunStatus, SessionId};
use fm_storage::Store;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Maximum ledger entries retained (drop-oldest).
pub const LEDGER_CAPACITY: usize = 512;

/// Phrases in assistant output that surface as approval-gate exceptions.
const APPROVAL_PHRASES: &[&str] = &[
    "approval required",
    "needs your approval",
    "waiting for approval",
    "requires human approval",
];

/// Outcome of one recorded tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    Ok,
    Failed,
    Timeout,
}

/// One recorded tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub tool_name: String,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub status: LedgerStatus,
    pub issued_at_ms: u64,
    pub completed_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub result_snippet: String,
}

/// A derived exception shown in the exceptions panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectException {
    pub id: String,
    pub project_id: ProjectId,
    pub source: String,
    pub category: String,
    pub severity: String,
    pub message: String,
    pub created_at_ms: u64,
    pub status: String,
}

/// Bounded ring of tool invocations plus the resolved-exception set.
#[derive(Clone, Default)]
pub struct ToolLedger {
    entries: Arc<Mutex<VecDeque<LedgerEntry>>>,
    resolved: Arc<Mutex<HashMap<String, HashSet<String>>>>,
}

impl ToolLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation, dropping the oldest entry at capacity.
    pub fn record(&self, entry: LedgerEntry) {
        let mut entries = self.entries.lock();
        if entries.len() >= LEDGER_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries for one project, oldest first.
    pub fn entries_for_project(&self, project_id: &ProjectId) -> Vec<LedgerEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.project_id == *project_id)
            .cloned()
            .collect()
    }

    /// Mark an exception resolved for a project.
    pub fn resolve(&self, project_id: &ProjectId, exception_id: &str) {
        self.resolved
            .lock()
            .entry(project_id.0.clone())
            .or_default()
            .insert(exception_id.to_string());
    }

    /// Derive the current exceptions for a project.
    pub fn exceptions(&self, store: &Store, project_id: &ProjectId) -> Vec<ProjectException> {
        let resolved = self
            .resolved
            .lock()
            .get(&project_id.0)
            .cloned()
            .unwrap_or_default();
        let mut exceptions = Vec::new();

        // Blocked stage-runs
        store.with(|state| {
            for run in state.runs_for_project(project_id) {
                for stage_run in state.stage_runs_for_run(&run.id) {
                    if stage_run.status == RunStatus::Blocked {
                        exceptions.push(ProjectException {
                            id: format!("stage-{}-{}", run.id, stage_run.stage),
                            project_id: project_id.clone(),
                            source: "run".to_string(),
                            category: "blocked_stage".to_string(),
                            severity: "high".to_string(),
                            message: format!(
                                "stage {} of run {} is blocked",
                                stage_run.stage,
                                run.id.short(8)
                            ),
                            created_at_ms: stage_run.updated_at_ms,
                            status: "open".to_string(),
                        });
                    }
                }
            }

            // Approval-gate phrases in assistant output
            for message in state.history_for_project(project_id) {
                if message.role != HistoryRole::Assistant {
                    continue;
                }
                let lower = message.content.to_lowercase();
                if APPROVAL_PHRASES.iter().any(|p| lower.contains(p)) {
                    exceptions.push(ProjectException {
                        id: format!("approval-{}", message.id),
                        project_id: project_id.clone(),
                        source: "orchestrator".to_string(),
                        category: "approval_gate".to_string(),
                        severity: "medium".to_string(),
                        message: message.content.clone(),
                        created_at_ms: message.created_at_ms,
                        status: "open".to_string(),
                    });
                }
            }
        });

        // Failed tool invocations
        for entry in self.entries_for_project(project_id) {
            if entry.status == LedgerStatus::Ok {
                continue;
            }
            exceptions.push(ProjectException {
                id: format!("tool-{}-{}", entry.tool_name, entry.issued_at_ms),
                project_id: project_id.clone(),
                source: "tool".to_string(),
                category: "tool_failure".to_string(),
                severity: "medium".to_string(),
                message: entry
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("{} failed", entry.tool_name)),
                created_at_ms: entry.issued_at_ms,
                status: "open".to_string(),
            });
        }

        for exception in &mut exceptions {
            if resolved.contains(&exception.id) {
                exception.status = "resolved".to_string();
            }
        }
        exceptions
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
