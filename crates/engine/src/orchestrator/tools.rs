// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed tool catalog for the orchestrator loop.
//!
//! The catalog is a tagged union of typed executors registered at
//! compile time; there is no reflection. Each tool declares the stages
//! it may run in, a JSON schema for the model, and an executor that
//! deserializes its own input record. Results and errors are plain
//! JSON, persisted (compacted) into tool history messages.

use crate::error::EngineError;
use crate::orchestrator::ledger::{LedgerEntry, LedgerStatus, ToolLedger};
use crate::review::ReviewGate;
use crate::runs::RunMachine;
use crate::sessions::SessionManager;
use crate::worktree::WorktreeEngine;
use fm_adapters::{MuxGateway, ToolSpec};
use fm_core::{
    Clock, IdGen, IssueSeverity, IssueStatus, KnowledgeId, ProjectId, ProjectKnowledge,
    ReviewCycleId, ReviewIssueId, RunStatus, SessionId, Stage, Task, TaskId, TaskStatus,
    WorktreeId,
};
use fm_storage::Store;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};

/// Synthetic error for calls outside a tool's stage allowlist.
pub const STAGE_DENIED: &str = "stage_tool_not_allowed";

/// Static definition of one catalog tool.
pub struct ToolDef {
    pub name: &'static str,
    pub stages: &'static [Stage],
    pub description: &'static str,
}

const ALL: &[Stage] = &[Stage::Plan, Stage::Build, Stage::Test];
const PLAN: &[Stage] = &[Stage::Plan];
const BUILD: &[Stage] = &[Stage::Build];
const TEST: &[Stage] = &[Stage::Test];
const PLAN_BUILD: &[Stage] = &[Stage::Plan, Stage::Build];

/// The catalog. New tools require code changes here.
pub const CATALOG: &[ToolDef] = &[
    ToolDef {
        name: "get_project_status",
        stages: ALL,
        description: "Snapshot of the project with its tasks, worktrees, and sessions.",
    },
    ToolDef {
        name: "get_current_run",
        stages: ALL,
        description: "Current run and its stage records, creating an active run if none exists.",
    },
    ToolDef {
        name: "transition_run_stage",
        stages: ALL,
        description: "Advance the run to a stage with a status and evidence. Stages never move backwards.",
    },
    ToolDef {
        name: "create_session",
        stages: ALL,
        description: "Spawn an agent TUI in a new multiplexer window for a task.",
    },
    ToolDef {
        name: "send_command",
        stages: ALL,
        description: "Send text to an agent session (policy-checked).",
    },
    ToolDef {
        name: "read_session_output",
        stages: ALL,
        description: "Read recent output lines from an agent session.",
    },
    ToolDef {
        name: "write_task_spec",
        stages: PLAN,
        description: "Write a spec file under the project repo, creating parent directories.",
    },
    ToolDef {
        name: "create_task",
        stages: PLAN_BUILD,
        description: "Create a pending task. Does not touch the current run.",
    },
    ToolDef {
        name: "create_worktree",
        stages: BUILD,
        description: "Create a git worktree on a new branch inside the repo.",
    },
    ToolDef {
        name: "merge_worktree",
        stages: BUILD,
        description: "Merge a worktree's branch into the target branch, reporting conflicts.",
    },
    ToolDef {
        name: "create_review_cycle",
        stages: BUILD,
        description: "Open a review cycle for a task at a commit.",
    },
    ToolDef {
        name: "create_review_issue",
        stages: BUILD,
        description: "Raise an issue against a review cycle.",
    },
    ToolDef {
        name: "update_review_issue",
        stages: BUILD,
        description: "Update or resolve a review issue; resolving the last one passes the cycle.",
    },
    ToolDef {
        name: "get_review_loop_status",
        stages: BUILD,
        description: "Aggregate review state for a task.",
    },
    ToolDef {
        name: "create_project_knowledge",
        stages: TEST,
        description: "Append a durable knowledge entry for the project.",
    },
];

/// Whether `name` exists and is allowed in `stage`.
pub fn allowed_in(name: &str, stage: Stage) -> Option<bool> {
    CATALOG
        .iter()
        .find(|t| t.name == name)
        .map(|t| t.stages.contains(&stage))
}

/// Tool schemas offered to the model for one stage.
pub fn specs_for_stage(stage: Stage) -> Vec<ToolSpec> {
    CATALOG
        .iter()
        .filter(|t| t.stages.contains(&stage))
        .map(|t| ToolSpec {
            name: t.name.to_string(),
            description: t.description.to_string(),
            input_schema: schema_for(t.name),
        })
        .collect()
}

fn schema_for(name: &str) -> Value {
    let object = |props: Value, required: &[&str]| {
        json!({"type": "object", "properties": props, "required": required})
    };
    match name {
        "get_project_status" | "get_current_run" => object(json!({}), &[]),
        "transition_run_stage" => object(
            json!({
                "to_stage": {"type": "string", "enum": ["plan", "build", "test"]},
                "status": {"type": "string", "enum": ["active", "completed", "failed", "blocked"]},
                "evidence": {"type": "object"},
            }),
            &["to_stage", "status"],
        ),
        "create_session" => object(
            json!({
                "task_id": {"type": "string"},
                "agent_type": {"type": "string"},
                "role": {"type": "string"},
            }),
            &["task_id", "agent_type", "role"],
        ),
        "send_command" => object(
            json!({
                "session_id": {"type": "string"},
                "text": {"type": "string"},
            }),
            &["session_id", "text"],
        ),
        "read_session_output" => object(
            json!({
                "session_id": {"type": "string"},
                "lines": {"type": "integer", "minimum": 1},
            }),
            &["session_id"],
        ),
        "write_task_spec" => object(
            json!({
                "task_id": {"type": "string"},
                "path": {"type": "string"},
                "content": {"type": "string"},
            }),
            &["path", "content"],
        ),
        "create_task" => object(
            json!({
                "title": {"type": "string"},
                "description": {"type": "string"},
                "depends_on": {"type": "array", "items": {"type": "string"}},
            }),
            &["title"],
        ),
        "create_worktree" => object(
            json!({
                "task_id": {"type": "string"},
                "branch_name": {"type": "string"},
                "path": {"type": "string"},
            }),
            &["branch_name"],
        ),
        "merge_worktree" => object(
            json!({
                "worktree_id": {"type": "string"},
                "target_branch": {"type": "string"},
            }),
            &["worktree_id"],
        ),
        "create_review_cycle" => object(
            json!({
                "task_id": {"type": "string"},
                "commit_hash": {"type": "string"},
            }),
            &["task_id", "commit_hash"],
        ),
        "create_review_issue" => object(
            json!({
                "cycle_id": {"type": "string"},
                "severity": {"type": "string", "enum": ["low", "medium", "high", "critical"]},
                "summary": {"type": "string"},
            }),
            &["cycle_id", "severity", "summary"],
        ),
        "update_review_issue" => object(
            json!({
                "issue_id": {"type": "string"},
                "status": {"type": "string", "enum": ["open", "resolved"]},
                "resolution": {"type": "string"},
            }),
            &["issue_id"],
        ),
        "get_review_loop_status" => object(
            json!({"task_id": {"type": "string"}}),
            &["task_id"],
        ),
        "create_project_knowledge" => object(
            json!({
                "kind": {"type": "string"},
                "title": {"type": "string"},
                "content": {"type": "string"},
            }),
            &["kind", "title", "content"],
        ),
        _ => object(json!({}), &[]),
    }
}

/// Everything a tool executor may touch.
pub struct ToolCtx<G: MuxGateway, C: Clock, I: IdGen> {
    pub store: Store,
    pub sessions: SessionManager<G, C, I>,
    pub runs: RunMachine<C, I>,
    pub review: ReviewGate<C, I>,
    pub worktrees: WorktreeEngine<C, I>,
    pub ledger: ToolLedger,
    pub clock: C,
    pub ids: I,
}

impl<G: MuxGateway, C: Clock, I: IdGen> Clone for ToolCtx<G, C, I> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            sessions: self.sessions.clone(),
            runs: self.runs.clone(),
            review: self.review.clone(),
            worktrees: self.worktrees.clone(),
            ledger: self.ledger.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
        }
    }
}

fn bad_input(e: serde_json::Error) -> String {
    format!("invalid tool input: {}", e)
}

fn engine_err(e: EngineError) -> String {
    e.to_string()
}

/// Execute a catalog tool. Errors come back as strings destined for
/// `tool_result{error}` events; they never abort the loop.
pub async fn execute<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
    name: &str,
    input: &Value,
) -> Result<Value, String> {
    let issued_at_ms = ctx.clock.epoch_ms();
    let result = dispatch(ctx, project_id, name, input).await;
    let completed_at_ms = ctx.clock.epoch_ms();

    let session_id = input
        .get("session_id")
        .and_then(Value::as_str)
        .map(SessionId::new);
    ctx.ledger.record(LedgerEntry {
        tool_name: name.to_string(),
        project_id: project_id.clone(),
        session_id,
        status: if result.is_ok() {
            LedgerStatus::Ok
        } else {
            LedgerStatus::Failed
        },
        issued_at_ms,
        completed_at_ms,
        error: result.as_ref().err().cloned(),
        result_snippet: result
            .as_ref()
            .map(|v| compact_snippet(v))
            .unwrap_or_default(),
    });

    result
}

/// Compact a JSON result to a history-safe snippet (2 KB).
pub fn compact_snippet(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 2048 {
        let mut cut = 2048;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}

async fn dispatch<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
    name: &str,
    input: &Value,
) -> Result<Value, String> {
    match name {
        "get_project_status" => get_project_status(ctx, project_id),
        "get_current_run" => get_current_run(ctx, project_id),
        "transition_run_stage" => transition_run_stage(ctx, project_id, input),
        "create_session" => create_session(ctx, input).await,
        "send_command" => send_command(ctx, input).await,
        "read_session_output" => read_session_output(ctx, input).await,
        "write_task_spec" => write_task_spec(ctx, project_id, input),
        "create_task" => create_task(ctx, project_id, input),
        "create_worktree" => create_worktree(ctx, project_id, input).await,
        "merge_worktree" => merge_worktree(ctx, input).await,
        "create_review_cycle" => create_review_cycle(ctx, input),
        "create_review_issue" => create_review_issue(ctx, input),
        "update_review_issue" => update_review_issue(ctx, input),
        "get_review_loop_status" => get_review_loop_status(ctx, input),
        "create_project_knowledge" => create_project_knowledge(ctx, project_id, input),
        other => Err(format!("unknown tool: {}", other)),
    }
}

fn get_project_status<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
) -> Result<Value, String> {
    ctx.store.with(|state| {
        let project = state
            .project(project_id)
            .cloned()
            .ok_or_else(|| format!("no such project: {}", project_id))?;
        Ok(json!({
            "project": project,
            "tasks": state.tasks_for_project(project_id),
            "worktrees": state.worktrees_for_project(project_id),
            "sessions": state.sessions_for_project(project_id),
        }))
    })
}

fn get_current_run<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
) -> Result<Value, String> {
    let (run, stage_runs) = ctx.runs.current_run(project_id).map_err(engine_err)?;
    Ok(json!({"run": run, "stage_runs": stage_runs}))
}

#[derive(Deserialize)]
struct TransitionInput {
    to_stage: String,
    status: String,
    #[serde(default)]
    evidence: Value,
}

fn transition_run_stage<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
    input: &Value,
) -> Result<Value, String> {
    let input: TransitionInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let to_stage: Stage = input
        .to_stage
        .parse()
        .map_err(|e: String| format!("invalid stage: {}", e))?;
    let status = match input.status.as_str() {
        "active" => RunStatus::Active,
        "completed" => RunStatus::Completed,
        "failed" => RunStatus::Failed,
        "blocked" => RunStatus::Blocked,
        other => return Err(format!("invalid status: {}", other)),
    };

    let (run, _) = ctx.runs.current_run(project_id).map_err(engine_err)?;
    let run = ctx
        .runs
        .transition(&run.id, project_id, to_stage, status, input.evidence)
        .map_err(engine_err)?;
    Ok(json!({"run": run}))
}

#[derive(Deserialize)]
struct CreateSessionInput {
    task_id: String,
    agent_type: String,
    role: String,
}

async fn create_session<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: CreateSessionInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let session = ctx
        .sessions
        .create(&TaskId::new(input.task_id), &input.agent_type, &input.role)
        .await
        .map_err(engine_err)?;
    Ok(json!({"session": session}))
}

#[derive(Deserialize)]
struct SendCommandInput {
    session_id: String,
    text: String,
}

async fn send_command<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: SendCommandInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let command = ctx
        .sessions
        .send_text(&SessionId::new(input.session_id), &input.text)
        .await
        .map_err(engine_err)?;
    Ok(json!({"command_id": command.id, "status": command.status}))
}

#[derive(Deserialize)]
struct ReadOutputInput {
    session_id: String,
    #[serde(default = "default_lines")]
    lines: u32,
}

fn default_lines() -> u32 {
    100
}

async fn read_session_output<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: ReadOutputInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let frames = ctx
        .sessions
        .get_output(&SessionId::new(input.session_id), input.lines, 0)
        .await
        .map_err(engine_err)?;
    Ok(json!({"frames": frames}))
}

#[derive(Deserialize)]
struct WriteSpecInput {
    #[serde(default)]
    task_id: Option<String>,
    path: String,
    content: String,
}

fn write_task_spec<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
    input: &Value,
) -> Result<Value, String> {
    let input: WriteSpecInput = serde_json::from_value(input.clone()).map_err(bad_input)?;

    let repo_path = ctx
        .store
        .with(|state| state.project(project_id).map(|p| p.repo_path.clone()))
        .ok_or_else(|| format!("no such project: {}", project_id))?;

    let relative = Path::new(&input.path);
    if relative.is_absolute() {
        return Err("spec path must be relative to the repo".to_string());
    }
    if relative.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err("spec path may not contain ..".to_string());
    }

    let target: PathBuf = repo_path.join(relative);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("create spec parents: {}", e))?;
    }
    std::fs::write(&target, &input.content).map_err(|e| format!("write spec: {}", e))?;

    if let Some(task_id) = input.task_id {
        ctx.store.with(|state| {
            if let Some(task) = state.task(&TaskId::new(&*task_id)) {
                let mut task = task.clone();
                task.spec_path = Some(input.path.clone());
                state.upsert_task(task);
            }
        });
    }

    Ok(json!({"path": input.path, "bytes": input.content.len()}))
}

#[derive(Deserialize)]
struct CreateTaskInput {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    depends_on: Vec<String>,
}

fn create_task<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
    input: &Value,
) -> Result<Value, String> {
    let input: CreateTaskInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    if input.title.trim().is_empty() {
        return Err("title must not be empty".to_string());
    }

    let task = Task {
        id: TaskId::new(ctx.ids.next()),
        project_id: project_id.clone(),
        title: input.title,
        description: input.description,
        status: TaskStatus::Pending,
        depends_on: input.depends_on.into_iter().map(TaskId::new).collect(),
        spec_path: None,
        worktree_id: None,
        created_at_ms: ctx.clock.epoch_ms(),
    };

    ctx.store.with(|state| {
        state
            .project(project_id)
            .ok_or_else(|| format!("no such project: {}", project_id))?;
        state.upsert_task(task.clone());
        Ok::<_, String>(())
    })?;

    Ok(json!({"task": task}))
}

#[derive(Deserialize)]
struct CreateWorktreeInput {
    #[serde(default)]
    task_id: Option<String>,
    branch_name: String,
    #[serde(default)]
    path: Option<String>,
}

async fn create_worktree<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
    input: &Value,
) -> Result<Value, String> {
    let input: CreateWorktreeInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let task_id = input.task_id.map(TaskId::new);
    let path = input.path.map(PathBuf::from);
    let worktree = ctx
        .worktrees
        .create(
            project_id,
            task_id.as_ref(),
            &input.branch_name,
            path.as_deref(),
        )
        .await
        .map_err(engine_err)?;
    Ok(json!({"worktree": worktree}))
}

#[derive(Deserialize)]
struct MergeWorktreeInput {
    worktree_id: String,
    #[serde(default)]
    target_branch: Option<String>,
}

async fn merge_worktree<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: MergeWorktreeInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let outcome = ctx
        .worktrees
        .merge(
            &WorktreeId::new(input.worktree_id),
            input.target_branch.as_deref(),
        )
        .await
        .map_err(engine_err)?;
    serde_json::to_value(&outcome).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct CreateCycleInput {
    task_id: String,
    commit_hash: String,
}

fn create_review_cycle<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: CreateCycleInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let cycle = ctx
        .review
        .create_cycle(&TaskId::new(input.task_id), &input.commit_hash)
        .map_err(engine_err)?;
    Ok(json!({"cycle": cycle}))
}

#[derive(Deserialize)]
struct CreateIssueInput {
    cycle_id: String,
    severity: IssueSeverity,
    summary: String,
}

fn create_review_issue<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: CreateIssueInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let issue = ctx
        .review
        .create_issue(
            &ReviewCycleId::new(input.cycle_id),
            input.severity,
            &input.summary,
        )
        .map_err(engine_err)?;
    Ok(json!({"issue": issue}))
}

#[derive(Deserialize)]
struct UpdateIssueInput {
    issue_id: String,
    #[serde(default)]
    status: Option<IssueStatus>,
    #[serde(default)]
    resolution: Option<String>,
}

fn update_review_issue<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: UpdateIssueInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let issue = ctx
        .review
        .update_issue(
            &ReviewIssueId::new(input.issue_id),
            input.status,
            input.resolution,
        )
        .map_err(engine_err)?;
    Ok(json!({"issue": issue}))
}

#[derive(Deserialize)]
struct LoopStatusInput {
    task_id: String,
}

fn get_review_loop_status<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    input: &Value,
) -> Result<Value, String> {
    let input: LoopStatusInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let status = ctx
        .review
        .loop_status(&TaskId::new(input.task_id))
        .map_err(engine_err)?;
    serde_json::to_value(&status).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct KnowledgeInput {
    kind: String,
    title: String,
    content: String,
}

fn create_project_knowledge<G: MuxGateway, C: Clock, I: IdGen>(
    ctx: &ToolCtx<G, C, I>,
    project_id: &ProjectId,
    input: &Value,
) -> Result<Value, String> {
    let input: KnowledgeInput = serde_json::from_value(input.clone()).map_err(bad_input)?;
    let entry = ProjectKnowledge {
        id: KnowledgeId::new(ctx.ids.next()),
        project_id: project_id.clone(),
        kind: input.kind,
        title: input.title,
        content: input.content,
        created_at_ms: ctx.clock.epoch_ms(),
    };
    ctx.store.with(|state| {
        state
            .project(project_id)
            .ok_or_else(|| format!("no such project: {}", project_id))?;
        state.append_knowledge(entry.clone());
        Ok::<_, String>(())
    })?;
    Ok(json!({"knowledge": entry}))
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
