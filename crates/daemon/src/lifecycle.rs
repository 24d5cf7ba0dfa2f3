// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon assembly and lifecycle.
//!
//! Builds the kernel from config (snapshot restore, playbook load,
//! adapters), owns the single-instance lock, and drives the periodic
//! snapshot plus clean shutdown.

use fm_adapters::{
    GitPorcelain, HttpModelClient, ModelClient, MuxGateway, TmuxGateway, TracedMux,
};
use fm_core::{Clock, IdGen, SystemClock, UuidIdGen};
use fm_engine::{
    EventHub, Orchestrator, ReviewGate, RunMachine, SessionManager, ToolLedger, WorktreeEngine,
};
use fm_playbook::{parse_playbook, playbook_hash, Playbook};
use fm_policy::PolicyConfig;
use fm_storage::{Snapshot, Store};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors during daemon startup and shutdown.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no data directory could be resolved (set FM_DATA_DIR)")]
    NoDataDir,
    #[error("no bearer token configured (set FM_TOKEN)")]
    NoToken,
    #[error("another daemon holds the lock at {0}")]
    LockFailed(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] fm_storage::SnapshotError),
    #[error("playbook error: {0}")]
    Playbook(#[from] fm_playbook::ParseError),
}

/// Daemon configuration, resolved from environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub token: String,
    pub listen_addr: String,
    pub model_base_url: String,
    pub model_api_key: String,
    pub playbook_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let data_dir = crate::env::data_dir().ok_or(LifecycleError::NoDataDir)?;
        let token = crate::env::token().ok_or(LifecycleError::NoToken)?;
        Ok(Self {
            data_dir,
            token,
            listen_addr: crate::env::listen_addr(),
            model_base_url: crate::env::model_base_url(),
            model_api_key: crate::env::model_api_key(),
            playbook_path: None,
        })
    }

    pub fn socket_path(&self) -> PathBuf {
        self.data_dir.join("fmd.sock")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("fmd.lock")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("snapshot.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// The assembled kernel, generic over its adapters.
pub struct Daemon<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> {
    pub store: Store,
    pub hub: EventHub,
    pub sessions: SessionManager<G, C, I>,
    pub runs: RunMachine<C, I>,
    pub review: ReviewGate<C, I>,
    pub worktrees: WorktreeEngine<C, I>,
    pub orch: Orchestrator<G, C, I, M>,
    pub playbook: Arc<Playbook>,
    pub playbook_hash: String,
    pub clock: C,
    pub ids: I,
}

impl<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> Daemon<G, C, I, M> {
    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    pub fn next_id(&self) -> String {
        self.ids.next()
    }
}

impl<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient> Clone for Daemon<G, C, I, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            hub: self.hub.clone(),
            sessions: self.sessions.clone(),
            runs: self.runs.clone(),
            review: self.review.clone(),
            worktrees: self.worktrees.clone(),
            orch: self.orch.clone(),
            playbook: Arc::clone(&self.playbook),
            playbook_hash: self.playbook_hash.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
        }
    }
}

/// Wire a kernel from parts. Shared by production startup and tests.
#[allow(clippy::too_many_arguments)]
pub fn assemble<G: MuxGateway, C: Clock, I: IdGen, M: ModelClient>(
    store: Store,
    gateway: G,
    clock: C,
    ids: I,
    model: M,
    playbook: Playbook,
    playbook_hash: String,
    policy: PolicyConfig,
) -> Daemon<G, C, I, M> {
    let hub = EventHub::new();
    let playbook = Arc::new(playbook);
    let ledger = ToolLedger::new();

    let review = ReviewGate::new(
        store.clone(),
        hub.clone(),
        clock.clone(),
        ids.clone(),
        Arc::clone(&playbook),
    );
    let sessions = SessionManager::new(
        gateway,
        store.clone(),
        hub.clone(),
        clock.clone(),
        ids.clone(),
        Arc::clone(&playbook),
        policy,
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
        model,
        sessions.clone(),
        runs.clone(),
        review.clone(),
        worktrees.clone(),
        ledger,
        clock.clone(),
        ids.clone(),
    );

    Daemon {
        store,
        hub,
        sessions,
        runs,
        review,
        worktrees,
        orch,
        playbook,
        playbook_hash,
        clock,
        ids,
    }
}

/// The concrete production daemon type.
pub type ProductionDaemon = Daemon<TracedMux<TmuxGateway>, SystemClock, UuidIdGen, HttpModelClient>;

/// Startup result: the daemon plus the held instance lock.
pub struct Startup {
    pub daemon: ProductionDaemon,
    pub lock: File,
}

/// Load the playbook next to the data dir, or fall back to built-ins.
fn load_playbook(config: &Config) -> Result<(Playbook, String), LifecycleError> {
    let path = match &config.playbook_path {
        Some(path) => Some(path.clone()),
        None => fm_playbook::find_playbook(&config.data_dir),
    };
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let playbook = parse_playbook(&content)?;
            tracing::info!(path = %path.display(), "playbook loaded");
            Ok((playbook, playbook_hash(&content)))
        }
        None => Ok((Playbook::builtin(), playbook_hash(""))),
    }
}

/// Build the production daemon: lock, restore, assemble.
pub fn startup(config: &Config) -> Result<Startup, LifecycleError> {
    std::fs::create_dir_all(&config.data_dir)?;

    let lock = File::create(config.lock_path())?;
    if lock.try_lock_exclusive().is_err() {
        return Err(LifecycleError::LockFailed(config.lock_path()));
    }

    let state = match Snapshot::load(&config.snapshot_path())? {
        Some(snapshot) => {
            tracing::info!(created_at = %snapshot.created_at, "snapshot restored");
            snapshot.state
        }
        None => Default::default(),
    };
    let store = Store::from_state(state);

    let (playbook, hash) = load_playbook(config)?;

    let daemon = assemble(
        store,
        TracedMux::new(TmuxGateway::new()),
        SystemClock,
        UuidIdGen,
        HttpModelClient::new(&config.model_base_url, &config.model_api_key),
        playbook,
        hash,
        PolicyConfig::default(),
    );

    Ok(Startup { daemon, lock })
}

/// Persist the store to the snapshot path.
pub fn save_snapshot(store: &Store, path: &Path) -> Result<(), fm_storage::SnapshotError> {
    Snapshot::new(store.snapshot_state()).save(path)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
