// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator loop: a bounded tool-call driver over the LLM.
//!
//! One `chat` call loads recent history, runs up to `max_tool_rounds`
//! model rounds, executes tool uses against the kernel (stage-gated),
//! and emits a typed event stream. Concurrent chats for one project
//! serialize on a per-project mutex so history stays monotonic.

pub mod ledger;
pub mod report;
pub mod tools;

use crate::error::EngineError;
use crate::hub::EventHub;
use crate::orchestrator::ledger::ToolLedger;
use crate::orchestrator::report::ProgressReport;
use crate::orchestrator::tools::{ToolCtx, STAGE_DENIED};
use crate::review::ReviewGate;
use crate::runs::RunMachine;
use crate::sessions::SessionManager;
use crate::worktree::WorktreeEngine;
use fm_adapters::{ContentBlock, MessageRole, ModelClient, ModelMessage, MuxGateway, TurnRequest};
use fm_core::{
    Clock, HistoryMessage, HistoryMessageId, HistoryRole, IdGen, ProjectId, StreamEvent,
};
use fm_storage::Store;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// History messages loaded into each chat call.
const HISTORY_WINDOW: usize = 50;

/// Output tokens requested per model turn.
const MAX_TOKENS: u32 = 4096;

/// The tool-driving orchestrator.
pub struct Orchestrator<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> {
    store: Store,
    hub: EventHub,
    model: M,
    ctx: ToolCtx<G, C, I>,
    clock: C,
    ids: I,
    // Per-project serialization of chat calls
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> Clone for Orchestrator<G, C, I, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            hub: self.hub.clone(),
            model: self.model.clone(),
            ctx: self.ctx.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> Orchestrator<G, C, I, M> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Store,
        hub: EventHub,
        model: M,
        sessions: SessionManager<G, C, I>,
        runs: RunMachine<C, I>,
        review: ReviewGate<C, I>,
        worktrees: WorktreeEngine<C, I>,
        ledger: ToolLedger,
        clock: C,
        ids: I,
    ) -> Self {
        let ctx = ToolCtx {
            store: store.clone(),
            sessions,
            runs,
            review,
            worktrees,
            ledger,
            clock: clock.clone(),
            ids: ids.clone(),
        };
        Self {
            store,
            hub,
            model,
            ctx,
            clock,
            ids,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ledger(&self) -> &ToolLedger {
        &self.ctx.ledger
    }

    fn lock_for(&self, project_id: &ProjectId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(project_id.0.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    fn persist(&self, project_id: &ProjectId, role: HistoryRole, content: &str) {
        let message = HistoryMessage {
            id: HistoryMessageId::new(self.ids.next()),
            project_id: project_id.clone(),
            role,
            content: content.to_string(),
            created_at_ms: self.clock.epoch_ms(),
        };
        self.store.with(|state| state.append_history(message));
    }

    async fn emit(
        &self,
        project_id: &ProjectId,
        events: &mpsc::Sender<StreamEvent>,
        event: StreamEvent,
    ) {
        self.hub.publish_orchestrator(project_id.clone(), event.clone());
        let _ = events.send(event).await;
    }

    fn system_prompt(&self, project_id: &ProjectId) -> String {
        self.store.with(|state| {
            let Some(project) = state.project(project_id) else {
                return String::new();
            };
            format!(
                "You are the orchestrator for the software project {:?} at {}. \
                 Decompose the operator's request, drive coder/reviewer/qa agents \
                 through their terminal sessions, and keep the review loop honest. \
                 Use the provided tools; finish your reply without tool calls when \
                 the request is handled.",
                project.name,
                project.repo_path.display()
            )
        })
    }

    fn conversation_from_history(&self, project_id: &ProjectId) -> Vec<ModelMessage> {
        let history = self
            .store
            .with(|state| state.recent_history(project_id, HISTORY_WINDOW));
        history
            .into_iter()
            .map(|message| match message.role {
                HistoryRole::User => ModelMessage::user_text(message.content),
                HistoryRole::Assistant => ModelMessage::assistant_text(message.content),
                HistoryRole::Tool => {
                    ModelMessage::user_text(format!("[tool result] {}", message.content))
                }
            })
            .collect()
    }

    /// Run one chat call.
    ///
    /// Streams `token` / `tool_call` / `tool_result` / `done` / `error`
    /// events into `events` (and the hub) and returns the assistant's
    /// accumulated text. Tool failures continue the loop; provider
    /// failures and cancellation close the stream with an `error`.
    pub async fn chat(
        &self,
        project_id: &ProjectId,
        user_message: &str,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<String, EngineError> {
        if user_message.trim().is_empty() {
            return Err(EngineError::invalid("message must not be empty"));
        }
        let (profile_model, max_rounds) = self.store.with(|state| {
            state
                .project(project_id)
                .ok_or_else(|| EngineError::not_found(format!("no such project: {}", project_id)))?;
            let profile = state.profile(project_id);
            Ok::<_, EngineError>((
                profile.map(|p| p.model.clone()).unwrap_or_default(),
                profile.map(|p| p.max_tool_rounds).unwrap_or(16).max(1),
            ))
        })?;

        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut conversation = self.conversation_from_history(project_id);
        conversation.push(ModelMessage::user_text(user_message));
        self.persist(project_id, HistoryRole::User, user_message);

        let system = self.system_prompt(project_id);
        let mut transcript = String::new();

        for round in 1..=max_rounds {
            if cancel.is_cancelled() {
                self.emit(
                    project_id,
                    &events,
                    StreamEvent::Error {
                        error: "cancelled".to_string(),
                    },
                )
                .await;
                return Err(EngineError::Cancelled);
            }

            let stage = self.ctx.runs.current_stage(project_id);
            let request = TurnRequest {
                model: profile_model.clone(),
                system: system.clone(),
                messages: conversation.clone(),
                tools: tools::specs_for_stage(stage),
                max_tokens: MAX_TOKENS,
            };

            // Forward streamed text chunks as token events while the
            // turn is in flight.
            let (token_tx, mut token_rx) = mpsc::channel::<String>(32);
            let forwarder = {
                let hub = self.hub.clone();
                let events = events.clone();
                let project_id = project_id.clone();
                tokio::spawn(async move {
                    while let Some(text) = token_rx.recv().await {
                        let event = StreamEvent::Token { text };
                        hub.publish_orchestrator(project_id.clone(), event.clone());
                        let _ = events.send(event).await;
                    }
                })
            };

            let turn_result = self.model.stream_turn(request, token_tx).await;
            let _ = forwarder.await;

            let turn = match turn_result {
                Ok(turn) => turn,
                Err(e) => {
                    let error = EngineError::Provider(e);
                    self.emit(
                        project_id,
                        &events,
                        StreamEvent::Error {
                            error: error.to_string(),
                        },
                    )
                    .await;
                    return Err(error);
                }
            };

            tracing::debug!(round, stage = %stage, tools = turn.tool_uses.len(), "model round");

            if !turn.text.is_empty() {
                self.persist(project_id, HistoryRole::Assistant, &turn.text);
                if !transcript.is_empty() {
                    transcript.push_str("\n\n");
                }
                transcript.push_str(&turn.text);
            }

            // Mirror the turn into the conversation, tool uses included
            let mut assistant_blocks = Vec::new();
            if !turn.text.is_empty() {
                assistant_blocks.push(ContentBlock::Text {
                    text: turn.text.clone(),
                });
            }
            for tool_use in &turn.tool_uses {
                assistant_blocks.push(ContentBlock::ToolUse {
                    id: tool_use.id.clone(),
                    name: tool_use.name.clone(),
                    input: tool_use.input.clone(),
                });
            }
            if !assistant_blocks.is_empty() {
                conversation.push(ModelMessage {
                    role: MessageRole::Assistant,
                    content: assistant_blocks,
                });
            }

            if turn.tool_uses.is_empty() {
                break;
            }

            let mut result_blocks = Vec::new();
            for tool_use in &turn.tool_uses {
                self.emit(
                    project_id,
                    &events,
                    StreamEvent::ToolCall {
                        id: tool_use.id.clone(),
                        name: tool_use.name.clone(),
                        input: tool_use.input.clone(),
                    },
                )
                .await;

                let stage_now = self.ctx.runs.current_stage(project_id);
                let result: Result<Value, String> =
                    match tools::allowed_in(&tool_use.name, stage_now) {
                        None => Err(format!("unknown tool: {}", tool_use.name)),
                        Some(false) => Err(STAGE_DENIED.to_string()),
                        Some(true) => {
                            tools::execute(&self.ctx, project_id, &tool_use.name, &tool_use.input)
                                .await
                        }
                    };

                let compact = match &result {
                    Ok(value) => tools::compact_snippet(value),
                    Err(error) => format!("{{\"error\":{}}}", Value::String(error.clone())),
                };
                self.persist(project_id, HistoryRole::Tool, &compact);

                self.emit(
                    project_id,
                    &events,
                    StreamEvent::ToolResult {
                        id: tool_use.id.clone(),
                        name: tool_use.name.clone(),
                        result: result.as_ref().ok().cloned(),
                        error: result.as_ref().err().cloned(),
                    },
                )
                .await;

                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: tool_use.id.clone(),
                    content: compact,
                });

                if cancel.is_cancelled() {
                    // Finish the current tool, then stop
                    self.emit(
                        project_id,
                        &events,
                        StreamEvent::Error {
                            error: "cancelled".to_string(),
                        },
                    )
                    .await;
                    return Err(EngineError::Cancelled);
                }
            }

            conversation.push(ModelMessage {
                role: MessageRole::User,
                content: result_blocks,
            });
        }

        self.emit(project_id, &events, StreamEvent::Done).await;
        Ok(transcript)
    }

    /// Synchronous aggregation of project progress.
    pub fn progress_report(&self, project_id: &ProjectId) -> Result<ProgressReport, EngineError> {
        report::generate(&self.store, &self.ctx.ledger, project_id)
    }

    /// Derived exceptions for the exceptions panel.
    pub fn exceptions(&self, project_id: &ProjectId) -> Vec<ledger::ProjectException> {
        self.ctx.ledger.exceptions(&self.store, project_id)
    }

    /// Mark an exception resolved.
    pub fn resolve_exception(&self, project_id: &ProjectId, exception_id: &str) {
        self.ctx.ledger.resolve(project_id, exception_id);
    }
}

#[cfg(test)]
#[path = "loop_tests.rs"]
mod loop_tests;
