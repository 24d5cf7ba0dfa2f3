// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux multiplexer gateway

use super::{MuxError, MuxGateway, WindowInfo};
use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Tmux-based multiplexer gateway
#[derive(Clone, Default)]
pub struct TmuxGateway;

impl TmuxGateway {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str], description: &str) -> Result<std::process::Output, MuxError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        run_with_timeout(cmd, TMUX_TIMEOUT, description)
            .await
            .map_err(MuxError::CommandFailed)
    }
}

#[async_trait]
impl MuxGateway for TmuxGateway {
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MuxError> {
        // Precondition: cwd must exist
        if !cwd.exists() {
            return Err(MuxError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        // Kill a stale session with the same name first
        if self.has_session(name).await.unwrap_or(false) {
            tracing::warn!(session = name, "session already exists, killing first");
            let _ = self.destroy_session(name).await;
        }

        let mut tmux_cmd = Command::new("tmux");
        tmux_cmd
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(name)
            .arg("-c")
            .arg(cwd)
            .arg("-P")
            .arg("-F")
            .arg("#{session_name}:#{window_index}");

        for (key, value) in env {
            tmux_cmd.arg("-e").arg(format!("{}={}", key, value));
        }

        tmux_cmd.arg(cmd);

        let output = run_with_timeout(tmux_cmd, TMUX_TIMEOUT, "tmux new-session")
            .await
            .map_err(MuxError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session = name, stderr = %stderr, "tmux spawn failed");
            return Err(MuxError::SpawnFailed(stderr.to_string()));
        }

        // Log stderr even on success - may contain useful warnings
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(session = name, stderr = %stderr, "tmux spawn stderr (non-fatal)");
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn has_session(&self, name: &str) -> Result<bool, MuxError> {
        let output = self.run(&["has-session", "-t", name], "tmux has-session").await?;
        Ok(output.status.success())
    }

    async fn destroy_session(&self, name: &str) -> Result<(), MuxError> {
        let output = self.run(&["kill-session", "-t", name], "tmux kill-session").await?;
        if !output.status.success() {
            // Session might already be dead, which is fine
        }
        Ok(())
    }

    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
        cmd: &str,
    ) -> Result<String, MuxError> {
        let cwd_str = cwd.to_string_lossy();
        let output = self
            .run(
                &[
                    "new-window",
                    "-t",
                    session,
                    "-n",
                    name,
                    "-c",
                    &cwd_str,
                    "-P",
                    "-F",
                    "#{session_name}:#{window_index}",
                    cmd,
                ],
                "tmux new-window",
            )
            .await?;

        if !output.status.success() {
            return Err(MuxError::NotFound(session.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, MuxError> {
        let output = self
            .run(
                &[
                    "list-windows",
                    "-t",
                    session,
                    "-F",
                    "#{session_name}:#{window_index}\t#{window_name}\t#{window_active}",
                ],
                "tmux list-windows",
            )
            .await?;

        if !output.status.success() {
            return Err(MuxError::NotFound(session.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter_map(|line| {
                let mut parts = line.split('\t');
                let id = parts.next()?.to_string();
                let name = parts.next()?.to_string();
                let active = parts.next()? == "1";
                Some(WindowInfo { id, name, active })
            })
            .collect())
    }

    async fn send_raw(&self, window: &str, text: &str) -> Result<(), MuxError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = self
            .run(&["send-keys", "-t", window, "-l", "--", text], "tmux send-keys")
            .await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(window.to_string()));
        }
        Ok(())
    }

    async fn send_key(&self, window: &str, key: &str) -> Result<(), MuxError> {
        let output = self
            .run(&["send-keys", "-t", window, key], "tmux send-keys")
            .await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(window.to_string()));
        }
        Ok(())
    }

    async fn resize(&self, window: &str, cols: u16, rows: u16) -> Result<(), MuxError> {
        let cols_str = cols.to_string();
        let rows_str = rows.to_string();
        let output = self
            .run(
                &["resize-window", "-t", window, "-x", &cols_str, "-y", &rows_str],
                "tmux resize-window",
            )
            .await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(window.to_string()));
        }
        Ok(())
    }

    async fn capture_pane(&self, window: &str, max_lines: u32) -> Result<Vec<String>, MuxError> {
        let start = format!("-{}", max_lines);
        let output = self
            .run(
                &["capture-pane", "-t", window, "-p", "-S", &start],
                "tmux capture-pane",
            )
            .await?;

        if !output.status.success() {
            return Err(MuxError::NotFound(window.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines: Vec<String> = stdout.lines().map(str::to_string).collect();
        let keep = max_lines as usize;
        if lines.len() > keep {
            lines.drain(..lines.len() - keep);
        }
        Ok(lines)
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
