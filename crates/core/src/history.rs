// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator conversation history. Append-only, listed oldest-first.

use crate::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a history message.
    pub struct HistoryMessageId;
}

/// Role of a history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
    Tool,
}

impl fmt::Display for HistoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRole::User => write!(f, "user"),
            HistoryRole::Assistant => write!(f, "assistant"),
            HistoryRole::Tool => write!(f, "tool"),
        }
    }
}

/// One message in a project's orchestrator conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: HistoryMessageId,
    pub project_id: ProjectId,
    pub role: HistoryRole,
    pub content: String,
    #[serde(default)]
    pub created_at_ms: u64,
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
