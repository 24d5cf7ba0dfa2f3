// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op multiplexer gateway for daemon smoke runs without tmux.

use super::{MuxError, MuxGateway, WindowInfo};
use async_trait::async_trait;
use std::path::Path;

/// Gateway that accepts every call and hosts nothing.
#[derive(Clone, Default)]
pub struct NoOpGateway;

impl NoOpGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MuxGateway for NoOpGateway {
    async fn create_session(
        &self,
        name: &str,
        _cwd: &Path,
        _cmd: &str,
        _env: &[(String, String)],
    ) -> Result<String, MuxError> {
        Ok(format!("{}:0", name))
    }

    async fn has_session(&self, _name: &str) -> Result<bool, MuxError> {
        Ok(false)
    }

    async fn destroy_session(&self, _name: &str) -> Result<(), MuxError> {
        Ok(())
    }

    async fn new_window(
        &self,
        session: &str,
        _name: &str,
        _cwd: &Path,
        _cmd: &str,
    ) -> Result<String, MuxError> {
        Ok(format!("{}:0", session))
    }

    async fn list_windows(&self, _session: &str) -> Result<Vec<WindowInfo>, MuxError> {
        Ok(Vec::new())
    }

    async fn send_raw(&self, _window: &str, _text: &str) -> Result<(), MuxError> {
        Ok(())
    }

    async fn send_key(&self, _window: &str, _key: &str) -> Result<(), MuxError> {
        Ok(())
    }

    async fn resize(&self, _window: &str, _cols: u16, _rows: u16) -> Result<(), MuxError> {
        Ok(())
    }

    async fn capture_pane(&self, _window: &str, _max_lines: u32) -> Result<Vec<String>, MuxError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
