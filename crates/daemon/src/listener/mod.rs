// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The listener runs in a spawned task, accepting connections and
//! handling each on its own task. Every request is authenticated
//! against the shared token (ping and hello excepted), dispatched to
//! the kernel, and answered with exactly one response.

mod orchestrator;
mod projects;
mod sessions;
mod worktrees;

use std::sync::Arc;
use std::time::Instant;

use fm_adapters::{ModelClient, MuxGateway};
use fm_core::{Clock, IdGen};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::frame::{self, WireError, IO_DEADLINE, SERVER_VERSION};
use crate::lifecycle::Daemon;
use crate::protocol::{Envelope, Request, Response};

/// Shared daemon context for all request handlers.
pub struct ListenCtx<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> {
    pub daemon: Daemon<G, C, I, M>,
    pub token: String,
    pub started: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<G, C, I, M>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

impl<G: MuxGateway, C: Clock + 'static, I: IdGen + 'static, M: ModelClient> Listener<G, C, I, M> {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx<G, C, I, M>>) -> Self {
        Self { socket, ctx }
    }

    /// Run the accept loop until the task is aborted.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Wire(WireError::Closed) => {
                                    debug!("client disconnected")
                                }
                                ConnectionError::Wire(WireError::TimedOut) => {
                                    warn!("connection timeout")
                                }
                                _ => error!("connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection: one request, one response.
async fn handle_connection<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    stream: UnixStream,
    ctx: &ListenCtx<G, C, I, M>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let envelope: Envelope = frame::recv_deadline(&mut reader, IO_DEADLINE).await?;

    if matches!(envelope.request, Request::Ping | Request::Hello { .. }) {
        debug!(request = ?envelope.request, "received request");
    } else {
        tracing::info!(request = ?envelope.request, "received request");
    }

    let response = handle_request(envelope.request, &envelope.token, ctx).await;
    frame::send_deadline(&mut writer, &response, IO_DEADLINE).await?;
    Ok(())
}

/// Authenticate and dispatch one request.
pub async fn handle_request<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    request: Request,
    token: &str,
    ctx: &ListenCtx<G, C, I, M>,
) -> Response {
    // Ping and hello are the OPTIONS of this protocol: always allowed
    match &request {
        Request::Ping => return Response::Pong,
        Request::Hello { .. } => {
            return Response::Hello {
                version: SERVER_VERSION.to_string(),
            }
        }
        _ => {}
    }

    if token != ctx.token {
        return Response::unauthorized();
    }

    match request {
        Request::Ping => Response::Pong,
        Request::Hello { .. } => Response::Hello {
            version: SERVER_VERSION.to_string(),
        },

        Request::Status => Response::Status {
            version: SERVER_VERSION.to_string(),
            uptime_secs: ctx.started.elapsed().as_secs(),
            projects: ctx.daemon.store.with(|s| s.projects().len()),
            subscribers: ctx.daemon.hub.subscriber_count(),
            playbook_hash: ctx.daemon.playbook_hash.clone(),
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::ProjectCreate { name, repo_path } => {
            projects::create(ctx, &name, &repo_path)
        }
        Request::ProjectList => projects::list(ctx),
        Request::ProjectGet { id } => projects::get(ctx, &id),
        Request::ProjectDelete { id } => projects::delete(ctx, &id),

        Request::TaskCreate {
            project_id,
            title,
            description,
            depends_on,
        } => projects::task_create(ctx, &project_id, &title, &description, depends_on),
        Request::TaskList { project_id } => projects::task_list(ctx, &project_id),
        Request::TaskComplete { id } => projects::task_complete(ctx, &id),

        Request::SessionCreate {
            task_id,
            agent_type,
            role,
        } => sessions::create(ctx, &task_id, &agent_type, &role).await,
        Request::SessionList { project_id } => sessions::list(ctx, &project_id),
        Request::SessionSend { id, text } => sessions::send(ctx, &id, &text).await,
        Request::SessionSendKey { id, key } => sessions::send_key(ctx, &id, &key).await,
        Request::SessionCommand { id, op } => sessions::command(ctx, &id, op).await,
        Request::SessionOutput { id, lines, since_us } => {
            sessions::output(ctx, &id, lines, since_us).await
        }
        Request::SessionIdle { id } => sessions::idle(ctx, &id),
        Request::SessionCloseCheck { id } => sessions::close_check(ctx, &id),
        Request::SessionTakeover { id, human_takeover } => {
            sessions::takeover(ctx, &id, human_takeover)
        }
        Request::SessionDelete { id } => sessions::delete(ctx, &id).await,

        Request::WorktreeCreate {
            project_id,
            task_id,
            branch_name,
            path,
        } => worktrees::create(ctx, &project_id, task_id, &branch_name, path).await,
        Request::WorktreeList { project_id } => worktrees::list(ctx, &project_id),
        Request::WorktreeMerge { id, target_branch } => {
            worktrees::merge(ctx, &id, target_branch).await
        }
        Request::WorktreeResolveConflict {
            id,
            session_id,
            message,
        } => worktrees::resolve_conflict(ctx, &id, session_id, message).await,
        Request::WorktreeDelete { id } => worktrees::delete(ctx, &id).await,

        Request::ReviewLoopStatus { task_id } => worktrees::review_status(ctx, &task_id),

        Request::CurrentRun { project_id } => {
            match ctx
                .daemon
                .runs
                .current_run(&fm_core::ProjectId::new(project_id))
            {
                Ok((run, stage_runs)) => Response::CurrentRun { run, stage_runs },
                Err(e) => Response::from_error(&e),
            }
        }

        Request::Chat {
            project_id,
            message,
        } => orchestrator::chat(ctx, &project_id, &message).await,
        Request::Report { project_id } => orchestrator::report(ctx, &project_id),
        Request::Exceptions { project_id } => orchestrator::exceptions(ctx, &project_id),
        Request::ExceptionResolve {
            project_id,
            exception_id,
        } => orchestrator::resolve_exception(ctx, &project_id, &exception_id),
        Request::KnowledgeList { project_id } => orchestrator::knowledge(ctx, &project_id),
    }
}

#[cfg(test)]
pub(crate) mod test_ctx;

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
