// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared listener context over fakes for daemon tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::ListenCtx;
use crate::lifecycle::assemble;
use fm_adapters::{FakeGateway, ScriptedModel};
use fm_core::{FakeClock, SequentialIdGen};
use fm_playbook::Playbook;
use fm_policy::PolicyConfig;
use fm_storage::Store;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;

pub(crate) type TestCtx = ListenCtx<FakeGateway, FakeClock, SequentialIdGen, ScriptedModel>;

pub(crate) const TEST_TOKEN: &str = "sesame";

/// A listener context over fakes, with an empty store.
pub(crate) fn test_ctx() -> (TestCtx, FakeGateway, ScriptedModel) {
    let gateway = FakeGateway::new();
    let model = ScriptedModel::new();
    let daemon = assemble(
        Store::new(),
        gateway.clone(),
        FakeClock::new(),
        SequentialIdGen::new("gen"),
        model.clone(),
        Playbook::builtin(),
        "testhash".to_string(),
        PolicyConfig::default(),
    );
    let ctx = ListenCtx {
        daemon,
        token: TEST_TOKEN.to_string(),
        started: Instant::now(),
        shutdown: Arc::new(Notify::new()),
    };
    (ctx, gateway, model)
}
