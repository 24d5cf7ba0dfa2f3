// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted model for testing the orchestrator loop
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ModelClient, ModelError, ModelTurn, ToolUse, TurnRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Model client that replays a queue of scripted turns.
///
/// When the queue runs dry it answers with an empty final turn, which
/// ends the orchestrator loop.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    turns: Arc<Mutex<VecDeque<ModelTurn>>>,
    requests: Arc<Mutex<Vec<TurnRequest>>>,
    fail_next: Arc<Mutex<Option<String>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a turn with text only.
    pub fn push_text(&self, text: &str) {
        self.turns.lock().push_back(ModelTurn {
            text: text.to_string(),
            tool_uses: Vec::new(),
        });
    }

    /// Queue a turn with text and tool uses.
    pub fn push_turn(&self, text: &str, tool_uses: Vec<ToolUse>) {
        self.turns.lock().push_back(ModelTurn {
            text: text.to_string(),
            tool_uses,
        });
    }

    /// Make the next call fail with a provider error.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    /// Requests observed so far, in order.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().clone()
    }

    /// Convenience: build a tool use with a sequential ID.
    pub fn tool_use(id: &str, name: &str, input: serde_json::Value) -> ToolUse {
        ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn stream_turn(
        &self,
        request: TurnRequest,
        tokens: mpsc::Sender<String>,
    ) -> Result<ModelTurn, ModelError> {
        self.requests.lock().push(request);

        if let Some(message) = self.fail_next.lock().take() {
            return Err(ModelError::Http(message));
        }

        let turn = self.turns.lock().pop_front().unwrap_or_default();
        if !turn.text.is_empty() {
            let _ = tokens.send(turn.text.clone()).await;
        }
        Ok(turn)
    }
}
