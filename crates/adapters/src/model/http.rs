// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming HTTP client for the provider's messages endpoint.
//!
//! Speaks the Anthropic-style wire shape: a POST with `stream: true`
//! answered by server-sent events. Only the event kinds the loop needs
//! are interpreted; unknown events are skipped.

use super::{ModelClient, ModelError, ModelTurn, ToolUse, TurnRequest};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// HTTP client for a Claude-compatible messages endpoint.
#[derive(Clone)]
pub struct HttpModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpModelClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn request_body(request: &TurnRequest) -> Value {
        json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": request.messages,
            "tools": request.tools,
            "stream": true,
        })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn stream_turn(
        &self,
        request: TurnRequest,
        tokens: mpsc::Sender<String>,
    ) -> Result<ModelTurn, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::Unconfigured("missing API key".to_string()));
        }

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(|e| ModelError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Http(format!("{}: {}", status, body)));
        }

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::default();
        let mut turn = TurnAccumulator::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ModelError::Http(e.to_string()))?;
            for data in parser.push(&chunk) {
                if let Some(text) = turn.apply(&data)? {
                    let _ = tokens.send(text).await;
                }
            }
        }

        turn.finish()
    }
}

/// Incremental `data:` line extractor for an SSE body.
#[derive(Default)]
struct SseParser {
    buffer: String,
}

impl SseParser {
    fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            if let Ok(value) = serde_json::from_str::<Value>(data) {
                events.push(value);
            }
        }

        events
    }
}

/// Folds streamed events into one [`ModelTurn`].
#[derive(Default)]
struct TurnAccumulator {
    text: String,
    tool_uses: Vec<ToolUse>,
    // Partial JSON per open tool_use block, keyed by block index
    partial_inputs: Vec<(usize, String)>,
    error: Option<String>,
}

impl TurnAccumulator {
    /// Apply one event; returns a text chunk to forward, if any.
    fn apply(&mut self, event: &Value) -> Result<Option<String>, ModelError> {
        match event["type"].as_str() {
            Some("content_block_start") => {
                let block = &event["content_block"];
                if block["type"] == "tool_use" {
                    let index = event["index"].as_u64().unwrap_or_default() as usize;
                    self.tool_uses.push(ToolUse {
                        id: block["id"].as_str().unwrap_or_default().to_string(),
                        name: block["name"].as_str().unwrap_or_default().to_string(),
                        input: Value::Null,
                    });
                    self.partial_inputs.push((index, String::new()));
                }
                Ok(None)
            }
            Some("content_block_delta") => {
                let delta = &event["delta"];
                match delta["type"].as_str() {
                    Some("text_delta") => {
                        let text = delta["text"].as_str().unwrap_or_default().to_string();
                        self.text.push_str(&text);
                        Ok(Some(text))
                    }
                    Some("input_json_delta") => {
                        let index = event["index"].as_u64().unwrap_or_default() as usize;
                        if let Some((_, buf)) =
                            self.partial_inputs.iter_mut().find(|(i, _)| *i == index)
                        {
                            buf.push_str(delta["partial_json"].as_str().unwrap_or_default());
                        }
                        Ok(None)
                    }
                    _ => Ok(None),
                }
            }
            Some("error") => {
                self.error = Some(
                    event["error"]["message"]
                        .as_str()
                        .unwrap_or("provider error")
                        .to_string(),
                );
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn finish(mut self) -> Result<ModelTurn, ModelError> {
        if let Some(error) = self.error {
            return Err(ModelError::Http(error));
        }

        // Parse accumulated tool inputs in block order
        for (slot, (_, raw)) in self.partial_inputs.iter().enumerate() {
            let input = if raw.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(raw)
                    .map_err(|e| ModelError::Protocol(format!("tool input: {}", e)))?
            };
            if let Some(tool_use) = self.tool_uses.get_mut(slot) {
                tool_use.input = input;
            }
        }

        Ok(ModelTurn {
            text: self.text,
            tool_uses: self.tool_uses,
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
