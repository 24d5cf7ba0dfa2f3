// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM provider client
//!
//! The provider is a black-box "messages with tools" streaming endpoint.
//! One call submits the conversation plus tool schemas and yields the
//! turn's text (streamed as chunks over a channel) and its tool-use
//! blocks. Everything provider-specific stays behind [`ModelClient`].

mod http;

pub use http::HttpModelClient;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod scripted;
#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the LLM provider
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider request failed: {0}")]
    Http(String),
    #[error("provider response malformed: {0}")]
    Protocol(String),
    #[error("provider not configured: {0}")]
    Unconfigured(String),
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One content block of a conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// One conversation message sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl ModelMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }
}

/// JSON-schema description of one callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// One complete model turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    /// Concatenated text blocks of the turn.
    pub text: String,
    /// Tool-use blocks in emission order; empty ends the loop.
    pub tool_uses: Vec<ToolUse>,
}

/// Request for one model turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ModelMessage>,
    pub tools: Vec<ToolSpec>,
    pub max_tokens: u32,
}

/// Client for the streaming messages-with-tools endpoint.
#[async_trait]
pub trait ModelClient: Clone + Send + Sync + 'static {
    /// Run one turn, streaming text chunks into `tokens` as they arrive.
    ///
    /// The returned turn carries the full text and any tool uses. Send
    /// errors on the token channel are ignored (the receiver may have
    /// hung up on cancellation).
    async fn stream_turn(
        &self,
        request: TurnRequest,
        tokens: mpsc::Sender<String>,
    ) -> Result<ModelTurn, ModelError>;
}
