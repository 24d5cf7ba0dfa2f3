// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state: every persisted entity under one lock.

use fm_core::{
    AgentSession, CommandId, HistoryMessage, OrchestratorProfile, Project, ProjectId,
    ProjectKnowledge, ReviewCycle, ReviewCycleId, ReviewIssue, ReviewIssueId, Run, RunId,
    SessionCommand, SessionId, Stage, StageRun, Task, TaskId, Worktree, WorktreeId,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// The complete persisted state.
///
/// Ordering guarantees live in the accessors: history and review cycles
/// list oldest-first ("latest" is the last element), project sessions
/// list newest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    projects: HashMap<String, Project>,
    #[serde(default)]
    profiles: HashMap<String, OrchestratorProfile>,
    #[serde(default)]
    tasks: HashMap<String, Task>,
    #[serde(default)]
    worktrees: HashMap<String, Worktree>,
    #[serde(default)]
    sessions: HashMap<String, AgentSession>,
    #[serde(default)]
    commands: HashMap<String, SessionCommand>,
    #[serde(default)]
    cycles: HashMap<String, ReviewCycle>,
    #[serde(default)]
    issues: HashMap<String, ReviewIssue>,
    #[serde(default)]
    runs: HashMap<String, Run>,
    #[serde(default)]
    stage_runs: Vec<StageRun>,
    #[serde(default)]
    history: Vec<HistoryMessage>,
    #[serde(default)]
    knowledge: Vec<ProjectKnowledge>,
}

impl StoreState {
    // -- projects --

    /// Insert a project together with its default orchestrator profile.
    ///
    /// One call, one transaction: a failed insert never leaves a
    /// dangling profile behind.
    pub fn insert_project(&mut self, project: Project, profile: OrchestratorProfile) {
        self.profiles.insert(project.id.0.clone(), profile);
        self.projects.insert(project.id.0.clone(), project);
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(&id.0)
    }

    pub fn update_project(&mut self, project: Project) {
        self.projects.insert(project.id.0.clone(), project);
    }

    /// Remove a project and everything it owns, profile included.
    pub fn remove_project(&mut self, id: &ProjectId) -> Option<Project> {
        let project = self.projects.remove(&id.0)?;
        self.profiles.remove(&id.0);

        let task_ids: Vec<String> = self
            .tasks
            .values()
            .filter(|t| t.project_id == *id)
            .map(|t| t.id.0.clone())
            .collect();
        for task_id in &task_ids {
            self.tasks.remove(task_id);
        }

        let session_ids: Vec<String> = self
            .sessions
            .values()
            .filter(|s| task_ids.contains(&s.task_id.0))
            .map(|s| s.id.0.clone())
            .collect();
        for session_id in &session_ids {
            self.sessions.remove(session_id);
        }
        self.commands
            .retain(|_, c| !session_ids.contains(&c.session_id.0));

        let cycle_ids: Vec<String> = self
            .cycles
            .values()
            .filter(|c| task_ids.contains(&c.task_id.0))
            .map(|c| c.id.0.clone())
            .collect();
        for cycle_id in &cycle_ids {
            self.cycles.remove(cycle_id);
        }
        self.issues
            .retain(|_, i| !cycle_ids.contains(&i.cycle_id.0));

        self.worktrees.retain(|_, w| w.project_id != *id);
        let run_ids: Vec<String> = self
            .runs
            .values()
            .filter(|r| r.project_id == *id)
            .map(|r| r.id.0.clone())
            .collect();
        self.runs.retain(|_, r| r.project_id != *id);
        self.stage_runs.retain(|sr| !run_ids.contains(&sr.run_id.0));
        self.history.retain(|m| m.project_id != *id);
        self.knowledge.retain(|k| k.project_id != *id);

        Some(project)
    }

    /// All projects, oldest first.
    pub fn projects(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.projects.values().cloned().collect();
        projects.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        projects
    }

    pub fn profile(&self, id: &ProjectId) -> Option<&OrchestratorProfile> {
        self.profiles.get(&id.0)
    }

    pub fn update_profile(&mut self, profile: OrchestratorProfile) {
        self.profiles.insert(profile.project_id.0.clone(), profile);
    }

    // -- tasks --

    pub fn upsert_task(&mut self, task: Task) {
        self.tasks.insert(task.id.0.clone(), task);
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(&id.0)
    }

    /// Tasks of a project, oldest first.
    pub fn tasks_for_project(&self, project_id: &ProjectId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.project_id == *project_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        tasks
    }

    // -- worktrees --

    pub fn upsert_worktree(&mut self, worktree: Worktree) {
        self.worktrees.insert(worktree.id.0.clone(), worktree);
    }

    pub fn worktree(&self, id: &WorktreeId) -> Option<&Worktree> {
        self.worktrees.get(&id.0)
    }

    pub fn worktrees_for_project(&self, project_id: &ProjectId) -> Vec<Worktree> {
        let mut worktrees: Vec<Worktree> = self
            .worktrees
            .values()
            .filter(|w| w.project_id == *project_id)
            .cloned()
            .collect();
        worktrees.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        worktrees
    }

    /// Remove a worktree, clearing any task link to it.
    pub fn remove_worktree(&mut self, id: &WorktreeId) -> Option<Worktree> {
        let worktree = self.worktrees.remove(&id.0)?;
        for task in self.tasks.values_mut() {
            if task.worktree_id.as_ref() == Some(id) {
                task.worktree_id = None;
            }
        }
        Some(worktree)
    }

    // -- sessions --

    pub fn upsert_session(&mut self, session: AgentSession) {
        self.sessions.insert(session.id.0.clone(), session);
    }

    pub fn session(&self, id: &SessionId) -> Option<&AgentSession> {
        self.sessions.get(&id.0)
    }

    pub fn remove_session(&mut self, id: &SessionId) -> Option<AgentSession> {
        self.commands.retain(|_, c| c.session_id != *id);
        self.sessions.remove(&id.0)
    }

    pub fn sessions_for_task(&self, task_id: &TaskId) -> Vec<AgentSession> {
        let mut sessions: Vec<AgentSession> = self
            .sessions
            .values()
            .filter(|s| s.task_id == *task_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        sessions
    }

    /// Sessions of a project, newest first.
    pub fn sessions_for_project(&self, project_id: &ProjectId) -> Vec<AgentSession> {
        let task_ids: Vec<&str> = self
            .tasks
            .values()
            .filter(|t| t.project_id == *project_id)
            .map(|t| t.id.0.as_str())
            .collect();
        let mut sessions: Vec<AgentSession> = self
            .sessions
            .values()
            .filter(|s| task_ids.contains(&s.task_id.0.as_str()))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });
        sessions
    }

    // -- session commands --

    pub fn insert_command(&mut self, command: SessionCommand) {
        self.commands.insert(command.id.0.clone(), command);
    }

    pub fn command(&self, id: &CommandId) -> Option<&SessionCommand> {
        self.commands.get(&id.0)
    }

    pub fn update_command(&mut self, command: SessionCommand) {
        self.commands.insert(command.id.0.clone(), command);
    }

    /// Commands of a session in issue order (the FIFO contract).
    pub fn commands_for_session(&self, session_id: &SessionId) -> Vec<SessionCommand> {
        let mut commands: Vec<SessionCommand> = self
            .commands
            .values()
            .filter(|c| c.session_id == *session_id)
            .cloned()
            .collect();
        commands.sort_by(|a, b| {
            a.issued_at_ms
                .cmp(&b.issued_at_ms)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        commands
    }

    // -- review cycles & issues --

    pub fn insert_cycle(&mut self, cycle: ReviewCycle) {
        self.cycles.insert(cycle.id.0.clone(), cycle);
    }

    pub fn cycle(&self, id: &ReviewCycleId) -> Option<&ReviewCycle> {
        self.cycles.get(&id.0)
    }

    pub fn update_cycle(&mut self, cycle: ReviewCycle) {
        self.cycles.insert(cycle.id.0.clone(), cycle);
    }

    /// Cycles of a task, oldest first; the latest cycle is the last.
    pub fn cycles_for_task(&self, task_id: &TaskId) -> Vec<ReviewCycle> {
        let mut cycles: Vec<ReviewCycle> = self
            .cycles
            .values()
            .filter(|c| c.task_id == *task_id)
            .cloned()
            .collect();
        cycles.sort_by(|a, b| {
            a.iteration
                .cmp(&b.iteration)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        cycles
    }

    pub fn latest_cycle_for_task(&self, task_id: &TaskId) -> Option<ReviewCycle> {
        self.cycles_for_task(task_id).into_iter().next_back()
    }

    pub fn insert_issue(&mut self, issue: ReviewIssue) {
        self.issues.insert(issue.id.0.clone(), issue);
    }

    pub fn issue(&self, id: &ReviewIssueId) -> Option<&ReviewIssue> {
        self.issues.get(&id.0)
    }

    pub fn update_issue(&mut self, issue: ReviewIssue) {
        self.issues.insert(issue.id.0.clone(), issue);
    }

    /// Issues of a cycle, oldest first.
    pub fn issues_for_cycle(&self, cycle_id: &ReviewCycleId) -> Vec<ReviewIssue> {
        let mut issues: Vec<ReviewIssue> = self
            .issues
            .values()
            .filter(|i| i.cycle_id == *cycle_id)
            .cloned()
            .collect();
        issues.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        issues
    }

    pub fn open_issue_count_for_cycle(&self, cycle_id: &ReviewCycleId) -> usize {
        self.issues
            .values()
            .filter(|i| i.cycle_id == *cycle_id && i.status == fm_core::IssueStatus::Open)
            .count()
    }

    /// Open issues across every cycle of a task.
    pub fn open_issue_count_for_task(&self, task_id: &TaskId) -> usize {
        self.cycles_for_task(task_id)
            .iter()
            .map(|c| self.open_issue_count_for_cycle(&c.id))
            .sum()
    }

    // -- runs & stage runs --

    pub fn insert_run(&mut self, run: Run) {
        self.runs.insert(run.id.0.clone(), run);
    }

    pub fn run(&self, id: &RunId) -> Option<&Run> {
        self.runs.get(&id.0)
    }

    pub fn update_run(&mut self, run: Run) {
        self.runs.insert(run.id.0.clone(), run);
    }

    /// Runs of a project, oldest first.
    pub fn runs_for_project(&self, project_id: &ProjectId) -> Vec<Run> {
        let mut runs: Vec<Run> = self
            .runs
            .values()
            .filter(|r| r.project_id == *project_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        runs
    }

    pub fn active_run_for_project(&self, project_id: &ProjectId) -> Option<Run> {
        self.runs
            .values()
            .find(|r| r.project_id == *project_id && r.status == fm_core::RunStatus::Active)
            .cloned()
    }

    pub fn latest_run_for_project(&self, project_id: &ProjectId) -> Option<Run> {
        self.runs_for_project(project_id).into_iter().next_back()
    }

    /// Insert or update the stage-run keyed by (run, stage).
    pub fn upsert_stage_run(&mut self, stage_run: StageRun) {
        if let Some(existing) = self
            .stage_runs
            .iter_mut()
            .find(|sr| sr.run_id == stage_run.run_id && sr.stage == stage_run.stage)
        {
            *existing = stage_run;
        } else {
            self.stage_runs.push(stage_run);
        }
    }

    pub fn stage_run(&self, run_id: &RunId, stage: Stage) -> Option<&StageRun> {
        self.stage_runs
            .iter()
            .find(|sr| sr.run_id == *run_id && sr.stage == stage)
    }

    /// Stage-runs of a run in lifecycle order.
    pub fn stage_runs_for_run(&self, run_id: &RunId) -> Vec<StageRun> {
        let mut stage_runs: Vec<StageRun> = self
            .stage_runs
            .iter()
            .filter(|sr| sr.run_id == *run_id)
            .cloned()
            .collect();
        stage_runs.sort_by_key(|sr| sr.stage.ordinal());
        stage_runs
    }

    // -- orchestrator history --

    /// Append-only; listing returns oldest-first.
    pub fn append_history(&mut self, message: HistoryMessage) {
        self.history.push(message);
    }

    pub fn history_for_project(&self, project_id: &ProjectId) -> Vec<HistoryMessage> {
        self.history
            .iter()
            .filter(|m| m.project_id == *project_id)
            .cloned()
            .collect()
    }

    /// The last `k` messages, still oldest-first.
    pub fn recent_history(&self, project_id: &ProjectId, k: usize) -> Vec<HistoryMessage> {
        let all = self.history_for_project(project_id);
        let start = all.len().saturating_sub(k);
        all[start..].to_vec()
    }

    // -- knowledge --

    pub fn append_knowledge(&mut self, entry: ProjectKnowledge) {
        self.knowledge.push(entry);
    }

    pub fn knowledge_for_project(&self, project_id: &ProjectId) -> Vec<ProjectKnowledge> {
        self.knowledge
            .iter()
            .filter(|k| k.project_id == *project_id)
            .cloned()
            .collect()
    }
}

/// Shared handle to the materialized state.
///
/// Each `with` call runs under the lock, making it the transaction
/// boundary required by the persistence contract.
#[derive(Clone, Default)]
pub struct Store {
    state: Arc<Mutex<StoreState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Run one transactional operation against the state.
    pub fn with<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state)
    }

    /// Clone the current state (for snapshots).
    pub fn snapshot_state(&self) -> StoreState {
        self.state.lock().clone()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
