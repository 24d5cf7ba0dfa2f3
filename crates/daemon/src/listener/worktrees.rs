// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree and review request handlers.

use super::ListenCtx;
use crate::protocol::Response;
use fm_adapters::{ModelClient, MuxGateway};
use fm_core::{Clock, IdGen, ProjectId, SessionId, TaskId, WorktreeId};
use std::path::PathBuf;

pub(crate) async fn create<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
    task_id: Option<String>,
    branch_name: &str,
    path: Option<String>,
) -> Response {
    let task_id = task_id.map(TaskId::new);
    let path = path.map(PathBuf::from);
    match ctx
        .daemon
        .worktrees
        .create(
            &ProjectId::new(project_id),
            task_id.as_ref(),
            branch_name,
            path.as_deref(),
        )
        .await
    {
        Ok(worktree) => Response::Worktree { worktree },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn list<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
) -> Response {
    Response::Worktrees {
        worktrees: ctx
            .daemon
            .store
            .with(|s| s.worktrees_for_project(&ProjectId::new(project_id))),
    }
}

pub(crate) async fn merge<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
    target_branch: Option<String>,
) -> Response {
    match ctx
        .daemon
        .worktrees
        .merge(&WorktreeId::new(id), target_branch.as_deref())
        .await
    {
        Ok(outcome) => Response::Merge { outcome },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) async fn resolve_conflict<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
    session_id: Option<String>,
    message: Option<String>,
) -> Response {
    let session_id = session_id.map(SessionId::new);
    match ctx
        .daemon
        .worktrees
        .resolve_conflict_handoff(
            &WorktreeId::new(id),
            session_id.as_ref(),
            message.as_deref(),
            &ctx.daemon.sessions,
        )
        .await
    {
        Ok(chosen) => Response::Handoff {
            session_id: chosen.map(|s| s.0),
        },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) async fn delete<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
) -> Response {
    match ctx.daemon.worktrees.remove(&WorktreeId::new(id)).await {
        Ok(()) => Response::Ok,
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn review_status<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    task_id: &str,
) -> Response {
    match ctx.daemon.review.loop_status(&TaskId::new(task_id)) {
        Ok(status) => Response::Review { status },
        Err(e) => Response::from_error(&e),
    }
}
