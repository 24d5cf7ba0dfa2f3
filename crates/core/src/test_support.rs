// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared by other crates' tests.
#![cfg_attr(coverage_nightly, coverage(off))]
#![allow(clippy::unwrap_used)]

use crate::{
    AgentSession, Project, ProjectId, ProjectStatus, ReviewCycle, ReviewCycleId, ReviewIssue,
    ReviewIssueId, SessionId, SessionStatus, Task, TaskId, TaskStatus, Worktree, WorktreeId,
    WorktreeStatus,
};
use crate::{CycleStatus, IssueSeverity, IssueStatus};
use std::path::PathBuf;

/// Build a project with an arbitrary repo path.
pub fn project(id: &str, name: &str) -> Project {
    Project {
        id: ProjectId::new(id),
        name: name.to_string(),
        repo_path: PathBuf::from("/tmp/repo"),
        status: ProjectStatus::Active,
        playbook_id: None,
        created_at_ms: 0,
    }
}

/// Build a project rooted at a real directory (tempdir tests).
pub fn project_at(id: &str, name: &str, repo: impl Into<PathBuf>) -> Project {
    Project {
        repo_path: repo.into(),
        ..project(id, name)
    }
}

pub fn task(id: &str, project_id: &str, title: &str) -> Task {
    Task {
        id: TaskId::new(id),
        project_id: ProjectId::new(project_id),
        title: title.to_string(),
        description: String::new(),
        status: TaskStatus::Pending,
        depends_on: Vec::new(),
        spec_path: None,
        worktree_id: None,
        created_at_ms: 0,
    }
}

pub fn session(id: &str, task_id: &str, role: &str) -> AgentSession {
    AgentSession {
        id: SessionId::new(id),
        task_id: TaskId::new(task_id),
        agent_type: "claude".to_string(),
        role: role.to_string(),
        mux_session_name: format!("proj-{}-{}", task_id, role),
        mux_window_id: format!("proj-{}-{}:0", task_id, role),
        status: SessionStatus::Running,
        human_attached: false,
        last_activity_at_ms: 0,
        created_at_ms: 0,
    }
}

pub fn worktree(id: &str, project_id: &str, branch: &str, path: impl Into<PathBuf>) -> Worktree {
    Worktree {
        id: WorktreeId::new(id),
        project_id: ProjectId::new(project_id),
        task_id: None,
        branch_name: branch.to_string(),
        path: path.into(),
        status: WorktreeStatus::Active,
        created_at_ms: 0,
    }
}

pub fn cycle(id: &str, task_id: &str, iteration: u32) -> ReviewCycle {
    ReviewCycle {
        id: ReviewCycleId::new(id),
        task_id: TaskId::new(task_id),
        iteration,
        commit_hash: "abc123".to_string(),
        status: CycleStatus::ReviewPending,
        created_at_ms: 0,
    }
}

pub fn issue(id: &str, cycle_id: &str, summary: &str) -> ReviewIssue {
    ReviewIssue {
        id: ReviewIssueId::new(id),
        cycle_id: ReviewCycleId::new(cycle_id),
        severity: IssueSeverity::High,
        summary: summary.to_string(),
        status: IssueStatus::Open,
        resolution: None,
        created_at_ms: 0,
    }
}
