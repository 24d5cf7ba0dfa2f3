// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous progress-report aggregator.

use crate::error::EngineError;
use crate::orchestrator::ledger::ToolLedger;
use fm_core::{
    CommandStatus, CycleStatus, ProjectId, RunStatus, SessionStatus, Stage, TaskId, TaskStatus,
};
use fm_storage::Store;
use serde::{Deserialize, Serialize};

/// Review posture of one task that has entered the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTaskSummary {
    pub task_id: TaskId,
    pub cycle_id: String,
    pub latest_iteration: u32,
    pub latest_status: CycleStatus,
    pub open_issues: usize,
}

/// One-shot aggregation of a project's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub phase: String,
    pub queue_depth: usize,
    pub active_sessions: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub blockers: Vec<String>,
    pub review_state: String,
    pub open_review_issues_total: usize,
    pub review_latest_iteration: u32,
    pub review_tasks_in_loop: usize,
    pub review_task_summaries: Vec<ReviewTaskSummary>,
    pub finalize_ready: bool,
}

/// Build the progress report for a project.
pub fn generate(
    store: &Store,
    ledger: &ToolLedger,
    project_id: &ProjectId,
) -> Result<ProgressReport, EngineError> {
    store.with(|state| {
        state
            .project(project_id)
            .ok_or_else(|| EngineError::not_found(format!("no such project: {}", project_id)))?;

        let tasks = state.tasks_for_project(project_id);
        let sessions = state.sessions_for_project(project_id);

        let pending_tasks = tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::Running))
            .count();
        let completed_tasks = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count();
        let active_sessions = sessions
            .iter()
            .filter(|s| matches!(s.status, SessionStatus::Running | SessionStatus::Working))
            .count();

        let queue_depth = sessions
            .iter()
            .map(|s| {
                state
                    .commands_for_session(&s.id)
                    .iter()
                    .filter(|c| !c.status.is_terminal() && c.status == CommandStatus::Queued)
                    .count()
            })
            .sum();

        // Blockers: blocked tasks and blocked stage-runs
        let mut blockers: Vec<String> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Blocked)
            .map(|t| format!("task {} is blocked", t.title))
            .collect();
        for run in state.runs_for_project(project_id) {
            for stage_run in state.stage_runs_for_run(&run.id) {
                if stage_run.status == RunStatus::Blocked {
                    blockers.push(format!("stage {} is blocked", stage_run.stage));
                }
            }
        }
        for entry in ledger.entries_for_project(project_id) {
            if entry.status != crate::orchestrator::ledger::LedgerStatus::Ok {
                blockers.push(format!(
                    "tool {} failed: {}",
                    entry.tool_name,
                    entry.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        // Fold latest cycle statuses across tasks
        let mut summaries = Vec::new();
        let mut open_review_issues_total = 0;
        let mut review_latest_iteration = 0;
        for task in &tasks {
            let Some(latest) = state.latest_cycle_for_task(&task.id) else {
                continue;
            };
            let open = state.open_issue_count_for_task(&task.id);
            open_review_issues_total += open;
            review_latest_iteration = review_latest_iteration.max(latest.iteration);
            summaries.push(ReviewTaskSummary {
                task_id: task.id.clone(),
                cycle_id: latest.id.0.clone(),
                latest_iteration: latest.iteration,
                latest_status: latest.status,
                open_issues: open,
            });
        }

        let review_tasks_in_loop = summaries
            .iter()
            .filter(|s| s.latest_status != CycleStatus::ReviewPassed || s.open_issues > 0)
            .count();

        let review_state = if summaries.is_empty() {
            "not_started"
        } else if summaries
            .iter()
            .any(|s| s.latest_status == CycleStatus::ReviewChangesRequested || s.open_issues > 0)
        {
            "changes_requested"
        } else if summaries.iter().all(|s| s.latest_status == CycleStatus::ReviewPassed) {
            "passed"
        } else if summaries.iter().any(|s| {
            matches!(
                s.latest_status,
                CycleStatus::ReviewPending | CycleStatus::ReviewRunning
            )
        }) {
            "in_review"
        } else {
            "unknown"
        };

        let stage = state
            .active_run_for_project(project_id)
            .map(|r| r.current_stage)
            .unwrap_or_else(|| crate::runs::derive_stage(&tasks));
        let phase = if blockers.is_empty() {
            stage.to_string()
        } else {
            "blocked".to_string()
        };

        let finalize_ready = !tasks.is_empty()
            && tasks.iter().all(|t| t.status == TaskStatus::Done)
            && open_review_issues_total == 0
            && stage == Stage::Test;

        Ok(ProgressReport {
            phase,
            queue_depth,
            active_sessions,
            pending_tasks,
            completed_tasks,
            blockers,
            review_state: review_state.to_string(),
            open_review_issues_total,
            review_latest_iteration,
            review_tasks_in_loop,
            review_task_summaries: summaries,
            finalize_ready,
        })
    })
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
