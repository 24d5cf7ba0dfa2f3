// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for the control plane.
//!
//! One request per connection: a token-bearing envelope around a tagged
//! request, answered by a tagged response. Errors carry the taxonomy
//! kind and its status code; clients render `message` verbatim.

use fm_core::{
    AgentSession, CommandOp, ErrorKind, OutputFrame, Project, ProjectKnowledge, Run, SessionCommand,
    StageRun, StreamEvent, Task, Worktree,
};
use fm_engine::{
    EngineError, GateDecision, IdleInfo, MergeOutcome, ProgressReport, ProjectException,
    ReviewLoopStatus,
};
use serde::{Deserialize, Serialize};

/// Token-bearing request envelope.
///
/// `Ping` and `Hello` pass without a token; everything else must match
/// the daemon's shared bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(default)]
    pub token: String,
    #[serde(flatten)]
    pub request: Request,
}

impl Envelope {
    pub fn new(token: impl Into<String>, request: Request) -> Self {
        Self {
            token: token.into(),
            request,
        }
    }

    pub fn unauthenticated(request: Request) -> Self {
        Self {
            token: String::new(),
            request,
        }
    }
}

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Get daemon status
    Status,

    /// Request daemon shutdown
    Shutdown,

    // -- projects --
    ProjectCreate {
        name: String,
        repo_path: String,
    },
    ProjectList,
    ProjectGet {
        id: String,
    },
    ProjectDelete {
        id: String,
    },

    // -- tasks --
    TaskCreate {
        project_id: String,
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        depends_on: Vec<String>,
    },
    TaskList {
        project_id: String,
    },
    /// Mark a task done (refused while review issues are open)
    TaskComplete {
        id: String,
    },

    // -- sessions --
    SessionCreate {
        task_id: String,
        agent_type: String,
        role: String,
    },
    SessionList {
        project_id: String,
    },
    SessionSend {
        id: String,
        text: String,
    },
    SessionSendKey {
        id: String,
        key: String,
    },
    /// Generic command enqueue (`op` carries the payload)
    SessionCommand {
        id: String,
        op: CommandOp,
    },
    SessionOutput {
        id: String,
        #[serde(default = "default_output_lines")]
        lines: u32,
        #[serde(default)]
        since_us: u64,
    },
    SessionIdle {
        id: String,
    },
    SessionCloseCheck {
        id: String,
    },
    SessionTakeover {
        id: String,
        human_takeover: bool,
    },
    SessionDelete {
        id: String,
    },

    // -- worktrees --
    WorktreeCreate {
        project_id: String,
        #[serde(default)]
        task_id: Option<String>,
        branch_name: String,
        #[serde(default)]
        path: Option<String>,
    },
    WorktreeList {
        project_id: String,
    },
    WorktreeMerge {
        id: String,
        #[serde(default)]
        target_branch: Option<String>,
    },
    WorktreeResolveConflict {
        id: String,
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    WorktreeDelete {
        id: String,
    },

    // -- review --
    ReviewLoopStatus {
        task_id: String,
    },

    // -- runs --
    CurrentRun {
        project_id: String,
    },

    // -- orchestrator --
    Chat {
        project_id: String,
        message: String,
    },
    Report {
        project_id: String,
    },
    Exceptions {
        project_id: String,
    },
    ExceptionResolve {
        project_id: String,
        exception_id: String,
    },
    KnowledgeList {
        project_id: String,
    },
}

fn default_output_lines() -> u32 {
    200
}

/// Response from the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Hello {
        version: String,
    },
    Ok,
    ShuttingDown,
    Error {
        code: u16,
        kind: String,
        message: String,
    },
    Status {
        version: String,
        uptime_secs: u64,
        projects: usize,
        subscribers: usize,
        playbook_hash: String,
    },
    Project {
        project: Project,
    },
    Projects {
        projects: Vec<Project>,
    },
    Task {
        task: Task,
    },
    Tasks {
        tasks: Vec<Task>,
    },
    Session {
        session: AgentSession,
    },
    Sessions {
        sessions: Vec<AgentSession>,
    },
    Command {
        command: SessionCommand,
    },
    Output {
        frames: Vec<OutputFrame>,
    },
    Idle {
        #[serde(flatten)]
        info: IdleInfo,
    },
    CloseCheck {
        #[serde(flatten)]
        gate: GateDecision,
    },
    Worktree {
        worktree: Worktree,
    },
    Worktrees {
        worktrees: Vec<Worktree>,
    },
    Merge {
        #[serde(flatten)]
        outcome: MergeOutcome,
    },
    Handoff {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    Review {
        #[serde(flatten)]
        status: ReviewLoopStatus,
    },
    Chat {
        response: String,
        events: Vec<StreamEvent>,
    },
    Report {
        #[serde(flatten)]
        report: ProgressReport,
    },
    Exceptions {
        exceptions: Vec<ProjectException>,
    },
    Knowledge {
        entries: Vec<ProjectKnowledge>,
    },
    CurrentRun {
        run: Run,
        stage_runs: Vec<StageRun>,
    },
}

impl Response {
    /// Map an engine error through the single status table.
    pub fn from_error(error: &EngineError) -> Self {
        let kind = error.kind();
        Response::Error {
            code: kind.status_code(),
            kind: kind.as_str().to_string(),
            message: error.to_string(),
        }
    }

    pub fn unauthorized() -> Self {
        Response::Error {
            code: 401,
            kind: "unauthorized".to_string(),
            message: "missing or invalid token".to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Response::Error {
            code: ErrorKind::InvalidArgument.status_code(),
            kind: ErrorKind::InvalidArgument.as_str().to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Response::Error {
            code: ErrorKind::NotFound.status_code(),
            kind: ErrorKind::NotFound.as_str().to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
