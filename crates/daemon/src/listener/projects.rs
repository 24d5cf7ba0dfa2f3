// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project and task request handlers.

use super::ListenCtx;
use crate::protocol::Response;
use fm_adapters::{ModelClient, MuxGateway};
use fm_core::{
    Clock, IdGen, OrchestratorProfile, Project, ProjectId, ProjectStatus, Task, TaskId, TaskStatus,
};
use std::path::PathBuf;

pub(crate) fn create<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    name: &str,
    repo_path: &str,
) -> Response {
    if name.trim().is_empty() {
        return Response::invalid("project name must not be empty");
    }
    let repo = PathBuf::from(repo_path);
    if !repo.is_absolute() {
        return Response::invalid("repo_path must be absolute");
    }
    if !repo.is_dir() {
        return Response::invalid(format!("repo_path is not a directory: {}", repo_path));
    }

    let daemon = &ctx.daemon;
    let project = Project {
        id: ProjectId::new(daemon.next_id()),
        name: name.to_string(),
        repo_path: repo,
        status: ProjectStatus::Active,
        playbook_id: None,
        created_at_ms: daemon.now_ms(),
    };

    // Profile defaults come from the playbook
    let defaults = daemon.playbook.profile();
    let mut profile = OrchestratorProfile::new(project.id.clone());
    profile.notify_on_blocked = defaults.notify_on_blocked;
    profile.max_tool_rounds = defaults.max_tool_rounds;
    profile.model = defaults.model;

    daemon
        .store
        .with(|state| state.insert_project(project.clone(), profile));
    Response::Project { project }
}

pub(crate) fn list<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
) -> Response {
    Response::Projects {
        projects: ctx.daemon.store.with(|s| s.projects()),
    }
}

pub(crate) fn get<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
) -> Response {
    match ctx
        .daemon
        .store
        .with(|s| s.project(&ProjectId::new(id)).cloned())
    {
        Some(project) => Response::Project { project },
        None => Response::not_found(format!("no such project: {}", id)),
    }
}

pub(crate) fn delete<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
) -> Response {
    match ctx
        .daemon
        .store
        .with(|s| s.remove_project(&ProjectId::new(id)))
    {
        Some(_) => Response::Ok,
        None => Response::not_found(format!("no such project: {}", id)),
    }
}

pub(crate) fn task_create<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
    title: &str,
    description: &str,
    depends_on: Vec<String>,
) -> Response {
    if title.trim().is_empty() {
        return Response::invalid("task title must not be empty");
    }
    let daemon = &ctx.daemon;
    let project_id = ProjectId::new(project_id);
    let task = Task {
        id: TaskId::new(daemon.next_id()),
        project_id: project_id.clone(),
        title: title.to_string(),
        description: description.to_string(),
        status: TaskStatus::Pending,
        depends_on: depends_on.into_iter().map(TaskId::new).collect(),
        spec_path: None,
        worktree_id: None,
        created_at_ms: daemon.now_ms(),
    };

    let inserted = daemon.store.with(|state| {
        if state.project(&project_id).is_none() {
            return false;
        }
        state.upsert_task(task.clone());
        true
    });
    if inserted {
        Response::Task { task }
    } else {
        Response::not_found(format!("no such project: {}", project_id))
    }
}

pub(crate) fn task_list<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
) -> Response {
    Response::Tasks {
        tasks: ctx
            .daemon
            .store
            .with(|s| s.tasks_for_project(&ProjectId::new(project_id))),
    }
}

pub(crate) fn task_complete<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
) -> Response {
    match ctx.daemon.review.complete_task(&TaskId::new(id)) {
        Ok(task) => Response::Task { task },
        Err(e) => Response::from_error(&e),
    }
}
