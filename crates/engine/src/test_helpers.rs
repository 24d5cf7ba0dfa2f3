// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared kernel fixture for engine tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::hub::EventHub;
use crate::orchestrator::ledger::ToolLedger;
use crate::orchestrator::Orchestrator;
use crate::review::ReviewGate;
use crate::runs::RunMachine;
use crate::sessions::SessionManager;
use crate::worktree::WorktreeEngine;
use fm_adapters::{FakeGateway, GitPorcelain, ScriptedModel};
use fm_core::test_support as fixtures;
use fm_core::{FakeClock, OrchestratorProfile, SequentialIdGen};
use fm_playbook::Playbook;
use fm_policy::PolicyConfig;
use fm_storage::Store;
use std::path::Path;
use std::sync::Arc;

pub type TestSessions = SessionManager<FakeGateway, FakeClock, SequentialIdGen>;
pub type TestOrchestrator = Orchestrator<FakeGateway, FakeClock, SequentialIdGen, ScriptedModel>;

pub struct Kernel {
    pub store: Store,
    pub hub: EventHub,
    pub gateway: FakeGateway,
    pub clock: FakeClock,
    pub ids: SequentialIdGen,
    pub model: ScriptedModel,
    pub ledger: ToolLedger,
    pub sessions: TestSessions,
    pub runs: RunMachine<FakeClock, SequentialIdGen>,
    pub review: ReviewGate<FakeClock, SequentialIdGen>,
    pub worktrees: WorktreeEngine<FakeClock, SequentialIdGen>,
    pub orch: TestOrchestrator,
}

impl Kernel {
    /// A tool context wired to this kernel's components.
    pub fn orch_ctx(&self) -> crate::orchestrator::tools::ToolCtx<FakeGateway, FakeClock, SequentialIdGen> {
        crate::orchestrator::tools::ToolCtx {
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

/// Build a kernel over fakes with a seeded project `p1` / task `t1`.
pub fn kernel_at(repo: &Path) -> Kernel {
    let store = Store::new();
    let hub = EventHub::new();
    let gateway = FakeGateway::new();
    let clock = FakeClock::new();
    let ids = SequentialIdGen::new("gen");
    let model = ScriptedModel::new();
    let ledger = ToolLedger::new();
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
        ledger.clone(),
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

    Kernel {
        store,
        hub,
        gateway,
        clock,
        ids,
        model,
        ledger,
        sessions,
        runs,
        review,
        worktrees,
        orch,
    }
}

/// Kernel with a repo path that exists but is not a git repository.
pub fn kernel() -> Kernel {
    kernel_at(Path::new("/tmp"))
}
