// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator request handlers.

use super::ListenCtx;
use crate::protocol::Response;
use fm_adapters::{ModelClient, MuxGateway};
use fm_core::{Clock, IdGen, ProjectId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(crate) async fn chat<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
    message: &str,
) -> Response {
    let project_id = ProjectId::new(project_id);

    // Drain the event stream concurrently so the loop never blocks on a
    // full channel.
    let (tx, mut rx) = mpsc::channel(64);
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });

    let result = ctx
        .daemon
        .orch
        .chat(&project_id, message, tx, CancellationToken::new())
        .await;
    let events = collector.await.unwrap_or_default();

    match result {
        Ok(response) => Response::Chat { response, events },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn report<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
) -> Response {
    match ctx.daemon.orch.progress_report(&ProjectId::new(project_id)) {
        Ok(report) => Response::Report { report },
        Err(e) => Response::from_error(&e),
    }
}

pub(crate) fn exceptions<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
) -> Response {
    Response::Exceptions {
        exceptions: ctx.daemon.orch.exceptions(&ProjectId::new(project_id)),
    }
}

pub(crate) fn resolve_exception<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
    exception_id: &str,
) -> Response {
    ctx.daemon
        .orch
        .resolve_exception(&ProjectId::new(project_id), exception_id);
    Response::Ok
}

pub(crate) fn knowledge<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    project_id: &str,
) -> Response {
    Response::Knowledge {
        entries: ctx
            .daemon
            .store
            .with(|s| s.knowledge_for_project(&ProjectId::new(project_id))),
    }
}
