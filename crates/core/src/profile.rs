// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project orchestrator profile.
//!
//! Created with the project and deleted with it in the same mutation.

use crate::project::ProjectId;
use serde::{Deserialize, Serialize};

fn default_notify_on_blocked() -> bool {
    true
}

fn default_max_tool_rounds() -> u32 {
    16
}

/// Tunables for a project's orchestrator loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorProfile {
    pub project_id: ProjectId,
    /// Whether `project_blocked` events raise a desktop notification.
    #[serde(default = "default_notify_on_blocked")]
    pub notify_on_blocked: bool,
    /// Upper bound on tool rounds per chat call.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// Model identifier passed to the LLM provider.
    #[serde(default)]
    pub model: String,
}

impl OrchestratorProfile {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            notify_on_blocked: true,
            max_tool_rounds: 16,
            model: String::new(),
        }
    }
}
