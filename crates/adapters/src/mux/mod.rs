// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiplexer gateway
//!
//! The gateway speaks to an external terminal multiplexer holding named
//! sessions of windows. Each agent session owns exactly one window; the
//! window target is an opaque string of the form `session:index`.

mod noop;
mod tmux;

pub use noop::NoOpGateway;
pub use tmux::TmuxGateway;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGateway, FakeWindow, MuxCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from multiplexer operations
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// One window of a multiplexer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Opaque window target (`session:index`).
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Adapter for the external terminal multiplexer.
#[async_trait]
pub trait MuxGateway: Clone + Send + Sync + 'static {
    /// Create a detached session running `cmd` in its first window.
    ///
    /// Returns the window target of that first window.
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MuxError>;

    /// Check whether a session exists.
    async fn has_session(&self, name: &str) -> Result<bool, MuxError>;

    /// Destroy a session and all its windows.
    async fn destroy_session(&self, name: &str) -> Result<(), MuxError>;

    /// Add a window to an existing session; returns its target.
    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
        cmd: &str,
    ) -> Result<String, MuxError>;

    /// List the windows of a session.
    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, MuxError>;

    /// Send literal text to a window, byte-exact (no key interpretation).
    async fn send_raw(&self, window: &str, text: &str) -> Result<(), MuxError>;

    /// Send a named key (multiplexer key syntax, e.g. `Enter`, `C-c`).
    async fn send_key(&self, window: &str, key: &str) -> Result<(), MuxError>;

    /// Resize a window.
    async fn resize(&self, window: &str, cols: u16, rows: u16) -> Result<(), MuxError>;

    /// Capture the last `max_lines` lines of a window's pane.
    async fn capture_pane(&self, window: &str, max_lines: u32) -> Result<Vec<String>, MuxError>;
}
