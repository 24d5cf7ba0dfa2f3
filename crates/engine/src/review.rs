// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review gate: cycle lifecycle, issue sync, and the close gate.
//!
//! A cycle may never be `review_passed` while it has open issues, and a
//! task may never be `done` while any of its cycles does. Strict roles
//! (per the playbook contract) cannot close their sessions until the
//! loop is satisfied.

use crate::error::EngineError;
use crate::hub::EventHub;
use fm_core::{
    AgentSession, Clock, CycleStatus, IdGen, IssueSeverity, IssueStatus, ProjectEvent,
    ProjectEventKind, ProjectId, ReviewCycle, ReviewCycleId, ReviewIssue, ReviewIssueId, Task,
    TaskId, TaskStatus,
};
use fm_playbook::Playbook;
use fm_storage::Store;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Aggregate review state for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLoopStatus {
    pub latest_cycle_id: Option<ReviewCycleId>,
    pub latest_iteration: u32,
    pub latest_status: Option<CycleStatus>,
    pub open_issues_total: usize,
    pub passed: bool,
    pub needs_fix: bool,
}

/// Close-gate verdict for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub can_close: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_verdict: Option<CycleStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_checks: Vec<String>,
}

impl GateDecision {
    fn open(reason: impl Into<String>) -> Self {
        Self {
            can_close: true,
            reason: reason.into(),
            review_verdict: None,
            required_checks: Vec::new(),
        }
    }
}

/// Review gate over the store.
pub struct ReviewGate<C: Clock, I: IdGen> {
    store: Store,
    hub: EventHub,
    clock: C,
    ids: I,
    playbook: Arc<Playbook>,
}

impl<C: Clock, I: IdGen> Clone for ReviewGate<C, I> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            hub: self.hub.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
            playbook: Arc::clone(&self.playbook),
        }
    }
}

impl<C: Clock, I: IdGen> ReviewGate<C, I> {
    pub fn new(store: Store, hub: EventHub, clock: C, ids: I, playbook: Arc<Playbook>) -> Self {
        Self {
            store,
            hub,
            clock,
            ids,
            playbook,
        }
    }

    fn project_for_task(&self, task_id: &TaskId) -> Result<(Task, ProjectId), EngineError> {
        self.store.with(|state| {
            let task = state
                .task(task_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such task: {}", task_id)))?;
            let project_id = task.project_id.clone();
            Ok((task, project_id))
        })
    }

    /// Open a new review cycle with the next iteration number.
    pub fn create_cycle(
        &self,
        task_id: &TaskId,
        commit_hash: &str,
    ) -> Result<ReviewCycle, EngineError> {
        let (_, _project_id) = self.project_for_task(task_id)?;
        let cycle = self.store.with(|state| {
            let iteration = state
                .latest_cycle_for_task(task_id)
                .map(|c| c.iteration + 1)
                .unwrap_or(1);
            let cycle = ReviewCycle {
                id: ReviewCycleId::new(self.ids.next()),
                task_id: task_id.clone(),
                iteration,
                commit_hash: commit_hash.to_string(),
                status: CycleStatus::ReviewPending,
                created_at_ms: self.clock.epoch_ms(),
            };
            state.insert_cycle(cycle.clone());
            cycle
        });
        tracing::info!(task = %task_id, iteration = cycle.iteration, "review cycle opened");
        Ok(cycle)
    }

    /// Append an issue to a cycle.
    ///
    /// If the cycle is not already `review_changes_requested`, it
    /// becomes so, and the iteration-completed (and, profile
    /// permitting, project-blocked) events fire.
    pub fn create_issue(
        &self,
        cycle_id: &ReviewCycleId,
        severity: IssueSeverity,
        summary: &str,
    ) -> Result<ReviewIssue, EngineError> {
        let (issue, changed_cycle, project_id, notify) = self.store.with(|state| {
            let cycle = state
                .cycle(cycle_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such cycle: {}", cycle_id)))?;
            let task = state
                .task(&cycle.task_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such task: {}", cycle.task_id)))?;

            let issue = ReviewIssue {
                id: ReviewIssueId::new(self.ids.next()),
                cycle_id: cycle_id.clone(),
                severity,
                summary: summary.to_string(),
                status: IssueStatus::Open,
                resolution: None,
                created_at_ms: self.clock.epoch_ms(),
            };
            state.insert_issue(issue.clone());

            let mut changed = None;
            if cycle.status != CycleStatus::ReviewChangesRequested {
                let mut updated = cycle.clone();
                updated.status = CycleStatus::ReviewChangesRequested;
                state.update_cycle(updated.clone());
                changed = Some(updated);
            }

            let notify = state
                .profile(&task.project_id)
                .map(|p| p.notify_on_blocked)
                .unwrap_or(true);
            Ok::<_, EngineError>((issue, changed, task.project_id.clone(), notify))
        })?;

        if let Some(cycle) = changed_cycle {
            self.hub.publish_project(ProjectEvent::new(
                project_id.clone(),
                ProjectEventKind::ReviewIterationCompleted,
                json!({
                    "task_id": cycle.task_id,
                    "cycle_id": cycle.id,
                    "iteration": cycle.iteration,
                    "status": cycle.status,
                }),
            ));
            if notify {
                self.hub.publish_project(ProjectEvent::new(
                    project_id,
                    ProjectEventKind::ProjectBlocked,
                    json!({
                        "task_id": cycle.task_id,
                        "cycle_id": cycle.id,
                        "reason": "review_changes_requested",
                    }),
                ));
            }
        }

        Ok(issue)
    }

    /// Update an issue; resolving the last open issue advances the
    /// cycle to `review_passed` and fires the pass events.
    pub fn update_issue(
        &self,
        issue_id: &ReviewIssueId,
        status: Option<IssueStatus>,
        resolution: Option<String>,
    ) -> Result<ReviewIssue, EngineError> {
        let (issue, cycle_id) = self.store.with(|state| {
            let mut issue = state
                .issue(issue_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such issue: {}", issue_id)))?;
            if let Some(status) = status {
                issue.status = status;
            }
            if let Some(resolution) = resolution {
                issue.resolution = Some(resolution);
            }
            state.update_issue(issue.clone());
            let cycle_id = issue.cycle_id.clone();
            Ok::<_, EngineError>((issue, cycle_id))
        })?;

        self.sync_cycle(&cycle_id)?;
        Ok(issue)
    }

    /// Recompute a cycle's status after issue churn.
    ///
    /// Zero open issues on a changes-requested cycle advances it to
    /// `review_passed`; any open issue pins it where it is.
    pub fn sync_cycle(&self, cycle_id: &ReviewCycleId) -> Result<(), EngineError> {
        let outcome = self.store.with(|state| {
            let cycle = state
                .cycle(cycle_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such cycle: {}", cycle_id)))?;
            let open = state.open_issue_count_for_cycle(cycle_id);
            if open == 0 && cycle.status == CycleStatus::ReviewChangesRequested {
                let mut updated = cycle.clone();
                updated.status = CycleStatus::ReviewPassed;
                state.update_cycle(updated.clone());
                let project_id = state
                    .task(&updated.task_id)
                    .map(|t| t.project_id.clone());
                return Ok::<_, EngineError>(Some((updated, project_id)));
            }
            Ok(None)
        })?;

        if let Some((cycle, Some(project_id))) = outcome {
            self.emit_pass_events(&project_id, &cycle);
        }
        Ok(())
    }

    /// Explicitly set a cycle's status. Passing with open issues is a
    /// conflict.
    pub fn set_cycle_status(
        &self,
        cycle_id: &ReviewCycleId,
        status: CycleStatus,
    ) -> Result<ReviewCycle, EngineError> {
        let (cycle, project_id, passed) = self.store.with(|state| {
            let mut cycle = state
                .cycle(cycle_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such cycle: {}", cycle_id)))?;
            if status == CycleStatus::ReviewPassed {
                let open = state.open_issue_count_for_cycle(cycle_id);
                if open > 0 {
                    return Err(EngineError::conflict(format!(
                        "cycle has {} open issues",
                        open
                    )));
                }
            }
            let passed =
                status == CycleStatus::ReviewPassed && cycle.status != CycleStatus::ReviewPassed;
            cycle.status = status;
            state.update_cycle(cycle.clone());
            let project_id = state.task(&cycle.task_id).map(|t| t.project_id.clone());
            Ok((cycle, project_id, passed))
        })?;

        if passed {
            if let Some(project_id) = project_id {
                self.emit_pass_events(&project_id, &cycle);
            }
        }
        Ok(cycle)
    }

    fn emit_pass_events(&self, project_id: &ProjectId, cycle: &ReviewCycle) {
        let payload = json!({
            "task_id": cycle.task_id,
            "cycle_id": cycle.id,
            "iteration": cycle.iteration,
            "status": cycle.status,
        });
        self.hub.publish_project(ProjectEvent::new(
            project_id.clone(),
            ProjectEventKind::ReviewIterationCompleted,
            payload.clone(),
        ));
        self.hub.publish_project(ProjectEvent::new(
            project_id.clone(),
            ProjectEventKind::ReviewLoopPassed,
            payload,
        ));
        self.hub.publish_project(ProjectEvent::new(
            project_id.clone(),
            ProjectEventKind::ProjectPhaseChanged,
            json!({"phase": "review", "passed": true}),
        ));
    }

    /// Aggregate review state for one task.
    pub fn loop_status(&self, task_id: &TaskId) -> Result<ReviewLoopStatus, EngineError> {
        self.project_for_task(task_id)?;
        Ok(self.store.with(|state| {
            let latest = state.latest_cycle_for_task(task_id);
            let open_issues_total = state.open_issue_count_for_task(task_id);
            let latest_status = latest.as_ref().map(|c| c.status);
            let passed =
                latest_status == Some(CycleStatus::ReviewPassed) && open_issues_total == 0;
            ReviewLoopStatus {
                latest_cycle_id: latest.as_ref().map(|c| c.id.clone()),
                latest_iteration: latest.as_ref().map(|c| c.iteration).unwrap_or(0),
                latest_status,
                open_issues_total,
                passed,
                needs_fix: latest_status == Some(CycleStatus::ReviewChangesRequested)
                    || open_issues_total > 0,
            }
        }))
    }

    /// The close gate: strict roles stay open until the task is done or
    /// the latest cycle passed with zero open issues.
    pub fn close_gate(&self, session: &AgentSession) -> GateDecision {
        if !self.playbook.is_strict_role(&session.role) {
            return GateDecision::open("role has no review contract");
        }

        self.store.with(|state| {
            let Some(task) = state.task(&session.task_id) else {
                return GateDecision::open("task is gone");
            };
            if task.status.is_done() {
                return GateDecision::open("task is done");
            }

            let latest = state.latest_cycle_for_task(&session.task_id);
            let open = state.open_issue_count_for_task(&session.task_id);
            let verdict = latest.as_ref().map(|c| c.status);
            let passed = verdict == Some(CycleStatus::ReviewPassed) && open == 0;

            if passed {
                GateDecision {
                    can_close: true,
                    reason: "review loop passed".to_string(),
                    review_verdict: verdict,
                    required_checks: Vec::new(),
                }
            } else {
                let mut required = Vec::new();
                if verdict != Some(CycleStatus::ReviewPassed) {
                    required.push("latest review cycle must pass".to_string());
                }
                if open > 0 {
                    required.push(format!("{} open review issues must be resolved", open));
                }
                GateDecision {
                    can_close: false,
                    reason: match verdict {
                        None => "no review cycle has run".to_string(),
                        Some(status) => format!("latest review cycle is {}", status),
                    },
                    review_verdict: verdict,
                    required_checks: required,
                }
            }
        })
    }

    /// Mark a task done; refused while the task has open review issues.
    pub fn complete_task(&self, task_id: &TaskId) -> Result<Task, EngineError> {
        self.store.with(|state| {
            let mut task = state
                .task(task_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such task: {}", task_id)))?;
            let open = state.open_issue_count_for_task(task_id);
            if open > 0 {
                return Err(EngineError::conflict(format!(
                    "task has {} open review issues",
                    open
                )));
            }
            task.status = TaskStatus::Done;
            state.upsert_task(task.clone());
            Ok(task)
        })
    }
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
