// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session request handlers.

use super::ListenCtx;
use crate::protocol::Response;
use fm_adapters::{ModelClient, MuxGateway};
use fm_core::{Clock, CommandOp, IdGen, ProjectId, SessionId, TaskId};

pub(crate) async fn create<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    task_id: &str,
    agent_type: &str,
    role: &str,
) -> Response {
    match ctx
        .daemon
        .sessions
        .create(&TaskId::new(task_id), agent_type, role)
        .await
    {
        Ok(session) => Response::Session { session },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn list<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
) -> Response {
    Response::Sessions {
        sessions: ctx
            .daemon
            .store
            .with(|s| s.sessions_for_project(&ProjectId::new(project_id))),
    }
}

pub(crate) async fn send<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
    text: &str,
) -> Response {
    match ctx.daemon.sessions.send_text(&SessionId::new(id), text).await {
        Ok(command) => Response::Command { command },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) async fn send_key<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
    key: &str,
) -> Response {
    match ctx.daemon.sessions.send_key(&SessionId::new(id), key).await {
        Ok(command) => Response::Command { command },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) async fn command<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
    op: CommandOp,
) -> Response {
    match ctx.daemon.sessions.enqueue(&SessionId::new(id), op).await {
        Ok(command) => Response::Command { command },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) async fn output<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
    lines: u32,
    since_us: u64,
) -> Response {
    match ctx
        .daemon
        .sessions
        .get_output(&SessionId::new(id), lines, since_us)
        .await
    {
        Ok(frames) => Response::Output { frames },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn idle<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
) -> Response {
    match ctx.daemon.sessions.idle_info(&SessionId::new(id)) {
        Ok(info) => Response::Idle { info },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn close_check<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
) -> Response {
    match ctx.daemon.sessions.close_check(&SessionId::new(id)) {
        Ok(gate) => Response::CloseCheck { gate },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn takeover<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
    human_takeover: bool,
) -> Response {
    match ctx
        .daemon
        .sessions
        .set_takeover(&SessionId::new(id), human_takeover)
    {
        Ok(session) => Response::Session { session },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) async fn delete<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    id: &str,
) -> Response {
    match ctx.daemon.sessions.destroy(&SessionId::new(id)).await {
        Ok(()) => Response::Ok,
        Err(e) => Response::from_error(&e),
    }
}
