// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playbook definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How to launch one agent type inside a multiplexer window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentTypeDef {
    /// Shell command that starts the agent TUI.
    pub command: String,
    /// Environment variables set on the spawned window.
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Role contract for the review close gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDef {
    /// Strict roles may not close their session until the task is done
    /// or the latest review cycle passed with zero open issues.
    #[serde(default)]
    pub strict_review: bool,
}

fn default_notify_on_blocked() -> bool {
    true
}

fn default_max_tool_rounds() -> u32 {
    16
}

/// Orchestrator defaults declared in the playbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileDef {
    #[serde(default = "default_notify_on_blocked")]
    pub notify_on_blocked: bool,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    #[serde(default)]
    pub model: String,
}

impl Default for ProfileDef {
    fn default() -> Self {
        Self {
            notify_on_blocked: true,
            max_tool_rounds: 16,
            model: String::new(),
        }
    }
}

/// A parsed playbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Playbook {
    #[serde(default, alias = "agent")]
    pub agents: IndexMap<String, AgentTypeDef>,
    #[serde(default, alias = "role")]
    pub roles: IndexMap<String, RoleDef>,
    #[serde(default)]
    pub orchestrator: Option<ProfileDef>,
}

impl Playbook {
    /// Get an agent type definition by name.
    pub fn get_agent(&self, name: &str) -> Option<&AgentTypeDef> {
        self.agents.get(name)
    }

    /// Whether a role participates in the strict review contract.
    ///
    /// Unknown roles are not strict; the built-in set marks coder,
    /// reviewer, and qa.
    pub fn is_strict_role(&self, role: &str) -> bool {
        self.roles.get(role).map(|r| r.strict_review).unwrap_or(false)
    }

    /// Orchestrator profile defaults, falling back to the built-ins.
    pub fn profile(&self) -> ProfileDef {
        self.orchestrator.clone().unwrap_or_default()
    }

    /// The playbook used when a project has none bound: a claude agent
    /// and the three strict review roles.
    pub fn builtin() -> Self {
        let mut agents = IndexMap::new();
        agents.insert(
            "claude".to_string(),
            AgentTypeDef {
                command: "claude".to_string(),
                env: IndexMap::new(),
                description: Some("Claude Code TUI".to_string()),
            },
        );

        let mut roles = IndexMap::new();
        for role in ["coder", "reviewer", "qa"] {
            roles.insert(
                role.to_string(),
                RoleDef {
                    strict_review: true,
                },
            );
        }
        roles.insert("planner".to_string(), RoleDef::default());

        Self {
            agents,
            roles,
            orchestrator: None,
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
