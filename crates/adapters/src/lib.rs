// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-adapters: gateways to the processes the kernel drives.
//!
//! Three seams live here: the terminal multiplexer (`mux`), the git
//! porcelain for worktrees (`git`), and the LLM provider (`model`).
//! Each is a trait with a production implementation that shells out or
//! speaks HTTP, and a fake for tests behind the `test-support` feature.

pub mod git;
pub mod model;
pub mod mux;
pub mod notify;
pub mod subprocess;
mod traced;

pub use git::{GitError, GitPorcelain};
pub use model::{
    ContentBlock, HttpModelClient, MessageRole, ModelClient, ModelError, ModelMessage, ModelTurn,
    ToolSpec, ToolUse, TurnRequest,
};
pub use mux::{MuxError, MuxGateway, NoOpGateway, TmuxGateway, WindowInfo};
pub use notify::{DesktopNotifier, Notifier, SilentNotifier};
pub use traced::TracedMux;

#[cfg(any(test, feature = "test-support"))]
pub use model::ScriptedModel;
#[cfg(any(test, feature = "test-support"))]
pub use mux::{FakeGateway, MuxCall};
