// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket event streaming.
//!
//! `GET /ws?token=…` upgrades to a frame channel. The server pushes
//! terminal frames, project events, and orchestrator events from the
//! hub; the client sends terminal input, resizes, focus changes, and
//! window kills. Slow clients lose their oldest frames (the hub outbox
//! is drop-oldest) instead of blocking publishers.

use crate::listener::ListenCtx;
use fm_adapters::{ModelClient, MuxGateway};
use fm_core::{Clock, IdGen, SessionId};
use fm_engine::{HubEvent, Topic};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Client-to-server frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    /// Replace the terminal-window focus set.
    Subscribe {
        #[serde(default)]
        windows: Vec<String>,
    },
    TerminalInput {
        session_id: String,
        keys: String,
    },
    TerminalResize {
        session_id: String,
        cols: u16,
        rows: u16,
    },
    KillWindow {
        session_id: String,
    },
}

/// Accept-loop for WebSocket clients.
pub async fn run<G: MuxGateway, C: Clock + 'static, I: IdGen + 'static, M: ModelClient>(
    listener: TcpListener,
    ctx: Arc<ListenCtx<G, C, I, M>>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    if let Err(e) = handle_socket(stream, &ctx).await {
                        debug!(%peer, error = %e, "websocket closed");
                    }
                });
            }
            Err(e) => warn!(error = %e, "websocket accept failed"),
        }
    }
}

fn token_from_query(uri: &str) -> Option<String> {
    let query = uri.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "token").then(|| value.to_string())
    })
}

async fn handle_socket<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    stream: TcpStream,
    ctx: &ListenCtx<G, C, I, M>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let expected = ctx.token.clone();
    let auth = move |request: &Request, response: Response| {
        let token = token_from_query(&request.uri().to_string());
        if token.as_deref() == Some(expected.as_str()) {
            Ok(response)
        } else {
            let mut reject = ErrorResponse::new(Some("invalid token".to_string()));
            *reject.status_mut() = tokio_tungstenite::tungstenite::http::StatusCode::UNAUTHORIZED;
            Err(reject)
        }
    };

    let socket = tokio_tungstenite::accept_hdr_async(stream, auth).await?;
    let (mut sink, mut source) = socket.split();

    // Every client gets project + orchestrator events; terminal frames
    // follow the client's focus set.
    let mut subscription = ctx.daemon.hub.subscribe(vec![Topic::AllProjects]);

    loop {
        // Resolve the select first, then act: the subscription is
        // mutably borrowed by its recv future inside the select.
        enum Step {
            Deliver(HubEvent),
            Client(Message),
            Closed,
        }

        let step = tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => Step::Deliver(event),
                None => Step::Closed,
            },
            message = source.next() => match message {
                Some(message) => Step::Client(message?),
                None => Step::Closed,
            },
        };

        match step {
            Step::Closed => break,
            Step::Deliver(event) => {
                let frame = match event {
                    HubEvent::Terminal(frame) => json!({
                        "type": "terminal_data",
                        "window": frame.window_id,
                        "text": frame.text,
                        "timestamp_us": frame.timestamp_us,
                    }),
                    HubEvent::Project(event) => json!({
                        "type": "project_event",
                        "project_id": event.project_id,
                        "kind": event.kind,
                        "payload": event.payload,
                    }),
                    HubEvent::Orchestrator { project_id, event } => json!({
                        "type": "orchestrator_event",
                        "project_id": project_id,
                        "event": event,
                    }),
                };
                sink.send(Message::text(frame.to_string())).await?;
            }
            Step::Client(message) => match message {
                Message::Text(text) => {
                    handle_client_frame(ctx, &subscription, &text).await;
                }
                Message::Close(_) => break,
                Message::Ping(payload) => sink.send(Message::Pong(payload)).await?,
                _ => {}
            },
        }
    }

    Ok(())
}

async fn handle_client_frame<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    ctx: &ListenCtx<G, C, I, M>,
    subscription: &fm_engine::Subscription,
    text: &str,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(error = %e, "unparseable client frame");
            return;
        }
    };

    match frame {
        ClientFrame::Subscribe { windows } => {
            let mut topics = vec![Topic::AllProjects];
            topics.extend(windows.into_iter().map(Topic::Terminal));
            subscription.set_topics(topics);
        }
        ClientFrame::TerminalInput { session_id, keys } => {
            if let Err(e) = ctx
                .daemon
                .sessions
                .send_text(&SessionId::new(session_id), &keys)
                .await
            {
                warn!(error = %e, "terminal input rejected");
            }
        }
        ClientFrame::TerminalResize {
            session_id,
            cols,
            rows,
        } => {
            if let Err(e) = ctx
                .daemon
                .sessions
                .resize(&SessionId::new(session_id), cols, rows)
                .await
            {
                warn!(error = %e, "terminal resize rejected");
            }
        }
        ClientFrame::KillWindow { session_id } => {
            // The close gate still applies to UI-initiated kills
            if let Err(e) = ctx.daemon.sessions.destroy(&SessionId::new(session_id)).await {
                warn!(error = %e, "window kill blocked");
            }
        }
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
