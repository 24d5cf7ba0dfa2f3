// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session lifecycle.
//!
//! Maps logical agent sessions onto multiplexer windows, runs the
//! per-session command pipeline, and folds pane captures into the
//! output rings. One multiplexer session (one window) per agent
//! session, for its whole lifetime.

use crate::error::EngineError;
use crate::hub::EventHub;
use crate::output::{OutputRing, CAPTURE_LINES};
use crate::review::ReviewGate;
use fm_adapters::MuxGateway;
use fm_core::{
    session_name, AgentSession, Clock, CommandId, CommandOp, CommandStatus, IdGen, NamedKey,
    OutputFrame, SessionCommand, SessionId, SessionStatus, Task, TaskId, TerminalFrame,
};
use fm_playbook::Playbook;
use fm_policy::PolicyConfig;
use fm_storage::Store;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Idle report for the orchestrator polling read.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IdleInfo {
    pub idle: bool,
    pub status: SessionStatus,
    pub waiting_review: bool,
    pub human_takeover: bool,
    pub last_activity_at_ms: u64,
}

/// Session lifecycle manager.
pub struct SessionManager<G: MuxGateway, C: Clock, I: IdGen> {
    gateway: G,
    store: Store,
    hub: EventHub,
    clock: C,
    ids: I,
    playbook: Arc<Playbook>,
    policy: PolicyConfig,
    review: ReviewGate<C, I>,
    rings: Arc<Mutex<HashMap<String, OutputRing>>>,
    // Per-session FIFO guard for the command pipeline
    queues: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl<G: MuxGateway, C: Clock, I: IdGen> Clone for SessionManager<G, C, I> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            store: self.store.clone(),
            hub: self.hub.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
            playbook: Arc::clone(&self.playbook),
            policy: self.policy.clone(),
            review: self.review.clone(),
            rings: Arc::clone(&self.rings),
            queues: Arc::clone(&self.queues),
        }
    }
}

impl<G: MuxGateway, C: Clock, I: IdGen> SessionManager<G, C, I> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: G,
        store: Store,
        hub: EventHub,
        clock: C,
        ids: I,
        playbook: Arc<Playbook>,
        policy: PolicyConfig,
        review: ReviewGate<C, I>,
    ) -> Self {
        Self {
            gateway,
            store,
            hub,
            clock,
            ids,
            playbook,
            policy,
            review,
            rings: Arc::new(Mutex::new(HashMap::new())),
            queues: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create an agent session: one new multiplexer session whose sole
    /// window hosts the agent TUI.
    pub async fn create(
        &self,
        task_id: &TaskId,
        agent_type: &str,
        role: &str,
    ) -> Result<AgentSession, EngineError> {
        let Some(agent_def) = self.playbook.get_agent(agent_type).cloned() else {
            return Err(EngineError::invalid(format!(
                "unknown agent type: {}",
                agent_type
            )));
        };

        let (task, project, cwd) = self.store.with(|state| {
            let task = state
                .task(task_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such task: {}", task_id)))?;
            let project = state.project(&task.project_id).cloned().ok_or_else(|| {
                EngineError::not_found(format!("no such project: {}", task.project_id))
            })?;
            let cwd = Self::work_dir(state, &task, &project.repo_path);
            Ok::<_, EngineError>((task, project, cwd))
        })?;

        let mux_name = session_name(&project.name, &task.title, role);
        let env: Vec<(String, String)> = agent_def
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let window = self
            .gateway
            .create_session(&mux_name, &cwd, &agent_def.command, &env)
            .await?;

        let session = AgentSession {
            id: SessionId::new(self.ids.next()),
            task_id: task.id.clone(),
            agent_type: agent_type.to_string(),
            role: role.to_string(),
            mux_session_name: mux_name.clone(),
            mux_window_id: window,
            status: SessionStatus::Running,
            human_attached: false,
            last_activity_at_ms: self.clock.epoch_ms(),
            created_at_ms: self.clock.epoch_ms(),
        };

        // Persist; if the task vanished underneath us, compensate by
        // tearing the multiplexer session back down.
        let persisted = self.store.with(|state| {
            if state.task(&task.id).is_none() {
                return Err(EngineError::not_found(format!(
                    "task removed during session create: {}",
                    task.id
                )));
            }
            state.upsert_session(session.clone());
            Ok(session.clone())
        });

        match persisted {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(mux_session = %mux_name, "persist failed, destroying session");
                let _ = self.gateway.destroy_session(&mux_name).await;
                Err(e)
            }
        }
    }

    /// Working directory for a task: its worktree if linked, else the
    /// project repo root.
    fn work_dir(state: &fm_storage::StoreState, task: &Task, repo_path: &std::path::Path) -> PathBuf {
        task.worktree_id
            .as_ref()
            .and_then(|id| state.worktree(id))
            .map(|w| w.path.clone())
            .unwrap_or_else(|| repo_path.to_path_buf())
    }

    fn session(&self, id: &SessionId) -> Result<AgentSession, EngineError> {
        self.store
            .with(|state| state.session(id).cloned())
            .ok_or_else(|| EngineError::not_found(format!("no such session: {}", id)))
    }

    fn queue_for(&self, session_id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut queues = self.queues.lock();
        Arc::clone(
            queues
                .entry(session_id.0.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    fn session_work_dir(&self, session: &AgentSession) -> PathBuf {
        self.store.with(|state| {
            let task = state.task(&session.task_id).cloned();
            let repo = task
                .as_ref()
                .and_then(|t| state.project(&t.project_id))
                .map(|p| p.repo_path.clone())
                .unwrap_or_else(|| PathBuf::from("/"));
            match task {
                Some(task) => Self::work_dir(state, &task, &repo),
                None => repo,
            }
        })
    }

    fn stamp(&self, command: &mut SessionCommand, status: CommandStatus) {
        let now = self.clock.epoch_ms();
        command.status = status;
        match status {
            CommandStatus::Sent => command.sent_at_ms = Some(now),
            CommandStatus::Acked => command.acked_at_ms = Some(now),
            CommandStatus::Completed => command.completed_at_ms = Some(now),
            CommandStatus::Queued | CommandStatus::Failed => {}
        }
        self.store.with(|state| state.update_command(command.clone()));
    }

    fn fail_command(&self, command: &mut SessionCommand, error: &str) {
        command.status = CommandStatus::Failed;
        command.error = Some(error.to_string());
        self.store.with(|state| state.update_command(command.clone()));
    }

    fn set_status(&self, session_id: &SessionId, status: SessionStatus) {
        let now = self.clock.epoch_ms();
        self.store.with(|state| {
            if let Some(session) = state.session(session_id) {
                let mut session = session.clone();
                session.status = status;
                session.last_activity_at_ms = now;
                state.upsert_session(session);
            }
        });
    }

    /// Enqueue and run one command through the pipeline.
    ///
    /// The synchronous path: the command row walks
    /// `queued → sent → acked → completed` (or `failed`) in order,
    /// stamping each transition. Per-session FIFO is enforced by the
    /// session's queue lock.
    pub async fn enqueue(
        &self,
        session_id: &SessionId,
        op: CommandOp,
    ) -> Result<SessionCommand, EngineError> {
        // Argument validation happens before a row is created
        match &op {
            CommandOp::SendText { text } if text.is_empty() => {
                return Err(EngineError::invalid("text must not be empty"));
            }
            CommandOp::Resize { cols, rows } if *cols == 0 || *rows == 0 => {
                return Err(EngineError::invalid("cols and rows must be positive"));
            }
            _ => {}
        }

        let session = self.session(session_id)?;
        let mut command = SessionCommand::new(
            CommandId::new(self.ids.next()),
            session_id.clone(),
            op,
            self.clock.epoch_ms(),
        );
        self.store.with(|state| state.insert_command(command.clone()));

        let queue = self.queue_for(session_id);
        let _guard = queue.lock().await;

        match self.run_command(&session, &mut command).await {
            Ok(()) => Ok(command),
            Err(e) => {
                self.fail_command(&mut command, &e.to_string());
                Err(e)
            }
        }
    }

    async fn run_command(
        &self,
        session: &AgentSession,
        command: &mut SessionCommand,
    ) -> Result<(), EngineError> {
        let window = session.mux_window_id.as_str();
        let op = command.op.clone();

        match &op {
            CommandOp::SendText { text } => {
                let work_dir = self.session_work_dir(session);
                if let Err(policy_error) =
                    fm_policy::validate_with_config(text, &work_dir, &self.policy)
                {
                    fm_policy::audit_rejection(
                        &work_dir,
                        session.id.as_str(),
                        text,
                        &policy_error,
                    );
                    return Err(EngineError::PolicyDenied(policy_error));
                }
                self.stamp(command, CommandStatus::Sent);
                self.gateway.send_raw(window, text).await?;
                self.stamp(command, CommandStatus::Acked);
                self.set_status(&session.id, SessionStatus::Working);
                self.stamp(command, CommandStatus::Completed);
            }
            CommandOp::SendKey { key } => {
                self.stamp(command, CommandStatus::Sent);
                self.gateway.send_key(window, key.mux_name()).await?;
                self.stamp(command, CommandStatus::Acked);
                self.set_status(&session.id, SessionStatus::Working);
                self.stamp(command, CommandStatus::Completed);
            }
            CommandOp::Interrupt => {
                self.stamp(command, CommandStatus::Sent);
                self.gateway.send_key(window, NamedKey::CtrlC.mux_name()).await?;
                self.stamp(command, CommandStatus::Acked);
                self.stamp(command, CommandStatus::Completed);
            }
            CommandOp::Resize { cols, rows } => {
                self.stamp(command, CommandStatus::Sent);
                self.gateway.resize(window, *cols, *rows).await?;
                self.stamp(command, CommandStatus::Acked);
                self.stamp(command, CommandStatus::Completed);
            }
            CommandOp::Close => {
                let gate = self.review.close_gate(session);
                if !gate.can_close {
                    return Err(EngineError::conflict(format!(
                        "session close blocked: {}",
                        gate.reason
                    )));
                }
                self.stamp(command, CommandStatus::Sent);
                self.gateway.destroy_session(&session.mux_session_name).await?;
                self.stamp(command, CommandStatus::Acked);
                self.set_status(&session.id, SessionStatus::Completed);
                self.stamp(command, CommandStatus::Completed);
            }
        }

        Ok(())
    }

    /// Send text to the session's window (policy-checked).
    pub async fn send_text(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<SessionCommand, EngineError> {
        self.enqueue(
            session_id,
            CommandOp::SendText {
                text: text.to_string(),
            },
        )
        .await
    }

    /// Send a named key; the name must be in the recognized set.
    pub async fn send_key(
        &self,
        session_id: &SessionId,
        key_name: &str,
    ) -> Result<SessionCommand, EngineError> {
        let key: NamedKey = key_name
            .parse()
            .map_err(|e: String| EngineError::invalid(e))?;
        self.enqueue(session_id, CommandOp::SendKey { key }).await
    }

    pub async fn interrupt(&self, session_id: &SessionId) -> Result<SessionCommand, EngineError> {
        self.enqueue(session_id, CommandOp::Interrupt).await
    }

    pub async fn resize(
        &self,
        session_id: &SessionId,
        cols: u16,
        rows: u16,
    ) -> Result<SessionCommand, EngineError> {
        self.enqueue(session_id, CommandOp::Resize { cols, rows }).await
    }

    /// Capture fresh pane output, fold it into the ring, and return the
    /// frames newer than `since_us`, at most `lines` of them, newest
    /// retained.
    pub async fn get_output(
        &self,
        session_id: &SessionId,
        lines: u32,
        since_us: u64,
    ) -> Result<Vec<OutputFrame>, EngineError> {
        if lines == 0 {
            return Err(EngineError::invalid("lines must be positive"));
        }
        let session = self.session(session_id)?;
        let captured = self
            .gateway
            .capture_pane(&session.mux_window_id, CAPTURE_LINES)
            .await?;

        let now_us = self.clock.epoch_us();
        let (new_frames, result) = {
            let mut rings = self.rings.lock();
            let ring = rings.entry(session.mux_window_id.clone()).or_default();
            let new_frames = ring.record_capture(captured, now_us);
            let mut result = ring.frames_since(since_us);
            let keep = lines as usize;
            if result.len() > keep {
                result.drain(..result.len() - keep);
            }
            (new_frames, result)
        };

        for frame in &new_frames {
            self.hub.publish_terminal(TerminalFrame {
                window_id: session.mux_window_id.clone(),
                text: frame.text.clone(),
                timestamp_us: frame.timestamp_us,
            });
        }

        Ok(result)
    }

    /// Toggle human takeover. `true` parks the session in
    /// `human_takeover`; `false` returns it to `idle`.
    pub fn set_takeover(
        &self,
        session_id: &SessionId,
        takeover: bool,
    ) -> Result<AgentSession, EngineError> {
        let mut session = self.session(session_id)?;
        session.human_attached = takeover;
        session.status = if takeover {
            SessionStatus::HumanTakeover
        } else {
            SessionStatus::Idle
        };
        session.last_activity_at_ms = self.clock.epoch_ms();
        self.store.with(|state| state.upsert_session(session.clone()));
        Ok(session)
    }

    /// Strict idle report: `waiting_review` and `human_takeover` are
    /// never idle, only reported.
    pub fn idle_info(&self, session_id: &SessionId) -> Result<IdleInfo, EngineError> {
        let session = self.session(session_id)?;
        Ok(IdleInfo {
            idle: session.status.is_idle(),
            status: session.status,
            waiting_review: session.status == SessionStatus::WaitingReview,
            human_takeover: session.status == SessionStatus::HumanTakeover,
            last_activity_at_ms: session.last_activity_at_ms,
        })
    }

    /// What the close gate would say right now.
    pub fn close_check(&self, session_id: &SessionId) -> Result<crate::review::GateDecision, EngineError> {
        let session = self.session(session_id)?;
        Ok(self.review.close_gate(&session))
    }

    /// Destroy the session if the review gate allows it.
    pub async fn destroy(&self, session_id: &SessionId) -> Result<(), EngineError> {
        let session = self.session(session_id)?;
        let gate = self.review.close_gate(&session);
        if !gate.can_close {
            return Err(EngineError::conflict(format!(
                "session close blocked: {}",
                gate.reason
            )));
        }
        self.gateway.destroy_session(&session.mux_session_name).await?;
        self.set_status(session_id, SessionStatus::Completed);
        Ok(())
    }

    /// Mark a session as waiting for review.
    pub fn mark_waiting_review(&self, session_id: &SessionId) -> Result<(), EngineError> {
        self.session(session_id)?;
        self.set_status(session_id, SessionStatus::WaitingReview);
        Ok(())
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
