//! Shared harness for the spec suite.

use fm_adapters::{FakeGateway, GitPorcelain, ScriptedModel};
use fm_core::test_support as fixtures;
use fm_core::{FakeClock, OrchestratorProfile, ProjectId, SequentialIdGen, StreamEvent, TaskId};
use fm_engine::{
    EventHub, Orchestrator, ReviewGate, RunMachine, SessionManager, ToolLedger, WorktreeEngine,
};
use fm_playbook::Playbook;
use fm_policy::PolicyConfig;
use fm_storage::Store;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct Harness {
    pub store: Store,
    pub hub: EventHub,
    pub gateway: FakeGateway,
    pub model: ScriptedModel,
    pub sessions: SessionManager<FakeGateway, FakeClock, SequentialIdGen>,
    pub runs: RunMachine<FakeClock, SequentialIdGen>,
    pub review: ReviewGate<FakeClock, SequentialIdGen>,
    pub worktrees: WorktreeEngine<FakeClock, SequentialIdGen>,
    pub orch: Orchestrator<FakeGateway, FakeClock, SequentialIdGen, ScriptedModel>,
}

impl Harness {
    /// Kernel over fakes, seeded with project `p1` (at `repo`) and task `t1`.
    pub fn at(repo: &Path) -> Self {
        let store = Store::new();
        let hub = EventHub::new();
        let gateway = FakeGateway::new();
        let clock = FakeClock::new();
        let ids = SequentialIdGen::new("gen");
        let model = ScriptedModel::new();
        let playbook = Arc::new(Playbook::builtin());

        let review = ReviewGate::new(
            store.clone(),
            hub.clone(),
            clock.clone(),
            ids.clone(),
            Arc::clone(&playbook),
        );
        let sessions = SessionManager::new(
            gateway.clone(),
            store.clone(),
            hub.clone(),
            clock.clone(),
            ids.clone(),
            Arc::clone(&playbook),
            PolicyConfig::default(),
            review.clone(),
        );
        let runs = RunMachine::new(store.clone(), hub.clone(), clock.clone(), ids.clone());
        let worktrees = WorktreeEngine::new(
            store.clone(),
            hub.clone(),
            GitPorcelain::new(),
            clock.clone(),
            ids.clone(),
        );
        let orch = Orchestrator::new(
            store.clone(),
            hub.clone(),
            model.clone(),
            sessions.clone(),
            runs.clone(),
            review.clone(),
            worktrees.clone(),
            ToolLedger::new(),
            clock.clone(),
            ids.clone(),
        );

        let project = fixtures::project_at("p1", "demo", repo);
        let profile = OrchestratorProfile::new(project.id.clone());
        let mut task = fixtures::task("t1", "p1", "build feature");
        task.created_at_ms = 1;
        store.with(|state| {
            state.insert_project(project, profile);
            state.upsert_task(task);
        });

        Self {
            store,
            hub,
            gateway,
            model,
            sessions,
            runs,
            review,
            worktrees,
            orch,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        ProjectId::new("p1")
    }

    pub fn task_id(&self) -> TaskId {
        TaskId::new("t1")
    }

    /// Run one chat call and collect the emitted events.
    pub async fn chat(&self, message: &str) -> (Result<String, fm_engine::EngineError>, Vec<StreamEvent>) {
        let (tx, mut rx) = mpsc::channel(256);
        let result = self
            .orch
            .chat(&self.project_id(), message, tx, CancellationToken::new())
            .await;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (result, events)
    }
}

/// Initialize a git repository with one commit on `main`.
pub async fn init_repo(repo: &Path) {
    for args in [
        vec!["init", "--quiet", "-b", "main"],
        vec!["config", "user.email", "spec@example.com"],
        vec!["config", "user.name", "Spec"],
    ] {
        git(repo, &args).await;
    }
    std::fs::write(repo.join("shared.txt"), "base\n").unwrap();
    git(repo, &["add", "."]).await;
    git(repo, &["commit", "--quiet", "-m", "init"]).await;
}

pub async fn git(repo: &Path, args: &[&str]) {
    let output = tokio::process::Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .await
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Names of tools called, in order.
pub fn tool_calls(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ToolCall { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

/// Tool errors observed, in order.
pub fn tool_errors(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ToolResult {
                error: Some(error), ..
            } => Some(error.clone()),
            _ => None,
        })
        .collect()
}

/// Whether the stream finished cleanly (done, no error events).
pub fn finished_clean(events: &[StreamEvent]) -> bool {
    events.iter().all(|e| !matches!(e, StreamEvent::Error { .. }))
        && matches!(events.last(), Some(StreamEvent::Done))
}
