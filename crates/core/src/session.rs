// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session records and the per-session command pipeline.
//!
//! An agent session is the server's logical handle to one multiplexer
//! window hosting an external agent TUI. Each session has exactly one
//! window for its whole lifetime. Commands flow through a durable
//! pipeline `queued → sent → acked → completed | failed`; timestamps
//! are stamped monotonically in that order.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id! {
    /// Unique identifier for an agent session.
    pub struct SessionId;
}

crate::define_id! {
    /// Unique identifier for a session command.
    pub struct CommandId;
}

/// Status of an agent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Working,
    Idle,
    WaitingReview,
    HumanTakeover,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Strict idle check: `waiting_review` and `human_takeover` are
    /// reported verbatim but never count as idle for polling.
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionStatus::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Working => write!(f, "working"),
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::WaitingReview => write!(f, "waiting_review"),
            SessionStatus::HumanTakeover => write!(f, "human_takeover"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The server's handle to one agent TUI in one multiplexer window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub id: SessionId,
    pub task_id: TaskId,
    /// Agent type from the playbook registry (e.g. "claude").
    pub agent_type: String,
    /// Role in the review contract (e.g. "coder", "reviewer", "qa").
    pub role: String,
    pub mux_session_name: String,
    pub mux_window_id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub human_attached: bool,
    #[serde(default)]
    pub last_activity_at_ms: u64,
    #[serde(default)]
    pub created_at_ms: u64,
}

/// Named keys accepted by `send_key`.
///
/// Anything outside this set is rejected as `InvalidArgument` before it
/// reaches the multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedKey {
    Enter,
    CtrlC,
    CtrlD,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

impl NamedKey {
    /// The multiplexer-side key name.
    pub fn mux_name(&self) -> &'static str {
        match self {
            NamedKey::Enter => "Enter",
            NamedKey::CtrlC => "C-c",
            NamedKey::CtrlD => "C-d",
            NamedKey::Escape => "Escape",
            NamedKey::Up => "Up",
            NamedKey::Down => "Down",
            NamedKey::Left => "Left",
            NamedKey::Right => "Right",
        }
    }
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mux_name())
    }
}

impl FromStr for NamedKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Enter" => Ok(NamedKey::Enter),
            "C-c" => Ok(NamedKey::CtrlC),
            "C-d" => Ok(NamedKey::CtrlD),
            "Escape" => Ok(NamedKey::Escape),
            "Up" => Ok(NamedKey::Up),
            "Down" => Ok(NamedKey::Down),
            "Left" => Ok(NamedKey::Left),
            "Right" => Ok(NamedKey::Right),
            other => Err(format!("unrecognized key: {}", other)),
        }
    }
}

/// Operation carried by a session command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommandOp {
    SendText { text: String },
    SendKey { key: NamedKey },
    Interrupt,
    Resize { cols: u16, rows: u16 },
    Close,
}

impl CommandOp {
    pub fn name(&self) -> &'static str {
        match self {
            CommandOp::SendText { .. } => "send_text",
            CommandOp::SendKey { .. } => "send_key",
            CommandOp::Interrupt => "interrupt",
            CommandOp::Resize { .. } => "resize",
            CommandOp::Close => "close",
        }
    }
}

/// Pipeline status of a session command.
///
/// Progresses strictly forward; `Failed` is terminal and never follows
/// `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Queued,
    Sent,
    Acked,
    Completed,
    Failed,
}

impl CommandStatus {
    /// Ordinal used to enforce monotonic progression.
    pub fn ordinal(&self) -> u8 {
        match self {
            CommandStatus::Queued => 0,
            CommandStatus::Sent => 1,
            CommandStatus::Acked => 2,
            CommandStatus::Completed => 3,
            CommandStatus::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Completed | CommandStatus::Failed)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Queued => write!(f, "queued"),
            CommandStatus::Sent => write!(f, "sent"),
            CommandStatus::Acked => write!(f, "acked"),
            CommandStatus::Completed => write!(f, "completed"),
            CommandStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One queued command against an agent session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCommand {
    pub id: CommandId,
    pub session_id: SessionId,
    #[serde(flatten)]
    pub op: CommandOp,
    pub status: CommandStatus,
    pub issued_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acked_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl SessionCommand {
    pub fn new(id: CommandId, session_id: SessionId, op: CommandOp, issued_at_ms: u64) -> Self {
        Self {
            id,
            session_id,
            op,
            status: CommandStatus::Queued,
            issued_at_ms,
            sent_at_ms: None,
            acked_at_ms: None,
            completed_at_ms: None,
            error: None,
            result: None,
        }
    }
}

/// A single captured output line with its synthetic timestamp.
///
/// Frames live only in the per-window ring; they are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFrame {
    pub text: String,
    /// Epoch microseconds; lines captured together get `base + i` stamps.
    pub timestamp_us: u64,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
