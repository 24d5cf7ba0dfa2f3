// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::mux::{MuxError, MuxGateway, WindowInfo};
use async_trait::async_trait;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any MuxGateway
#[derive(Clone)]
pub struct TracedMux<G> {
    inner: G,
}

impl<G> TracedMux<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: MuxGateway> MuxGateway for TracedMux<G> {
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MuxError> {
        async {
            tracing::info!(cmd, env_count = env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.create_session(name, cwd, cmd, env).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(window) => tracing::info!(window, elapsed_ms, "session created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!("mux.create_session", name, cwd = %cwd.display()))
        .await
    }

    async fn has_session(&self, name: &str) -> Result<bool, MuxError> {
        self.inner.has_session(name).await
    }

    async fn destroy_session(&self, name: &str) -> Result<(), MuxError> {
        let result = self.inner.destroy_session(name).await;
        match &result {
            Ok(()) => tracing::info!(name, "session destroyed"),
            Err(e) => tracing::error!(name, error = %e, "destroy failed"),
        }
        result
    }

    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
        cmd: &str,
    ) -> Result<String, MuxError> {
        self.inner
            .new_window(session, name, cwd, cmd)
            .instrument(tracing::info_span!("mux.new_window", session, name))
            .await
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, MuxError> {
        self.inner.list_windows(session).await
    }

    async fn send_raw(&self, window: &str, text: &str) -> Result<(), MuxError> {
        tracing::info_span!("mux.send_raw", window)
            .in_scope(|| tracing::debug!(text_len = text.len(), "sending"));
        let result = self.inner.send_raw(window, text).await;
        if let Err(ref e) = result {
            tracing::error!(window, error = %e, "send failed");
        }
        result
    }

    async fn send_key(&self, window: &str, key: &str) -> Result<(), MuxError> {
        let result = self.inner.send_key(window, key).await;
        if let Err(ref e) = result {
            tracing::error!(window, key, error = %e, "send key failed");
        }
        result
    }

    async fn resize(&self, window: &str, cols: u16, rows: u16) -> Result<(), MuxError> {
        self.inner.resize(window, cols, rows).await
    }

    async fn capture_pane(&self, window: &str, max_lines: u32) -> Result<Vec<String>, MuxError> {
        self.inner.capture_pane(window, max_lines).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
