// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake multiplexer gateway for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MuxError, MuxGateway, WindowInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum MuxCall {
    CreateSession {
        name: String,
        cwd: PathBuf,
        cmd: String,
        env: Vec<(String, String)>,
    },
    DestroySession {
        name: String,
    },
    NewWindow {
        session: String,
        name: String,
    },
    SendRaw {
        window: String,
        text: String,
    },
    SendKey {
        window: String,
        key: String,
    },
    Resize {
        window: String,
        cols: u16,
        rows: u16,
    },
    CapturePane {
        window: String,
    },
}

/// State of a fake window
#[derive(Debug, Clone, Default)]
pub struct FakeWindow {
    pub name: String,
    pub cwd: PathBuf,
    pub cmd: String,
    pub env: Vec<(String, String)>,
    /// Scripted pane content returned by `capture_pane`.
    pub pane: Vec<String>,
    /// Raw text delivered through `send_raw`, in order.
    pub sent: Vec<String>,
    /// Named keys delivered through `send_key`, in order.
    pub keys: Vec<String>,
    pub size: Option<(u16, u16)>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<MuxCall>,
    // session name -> window target list
    sessions: HashMap<String, Vec<String>>,
    windows: HashMap<String, FakeWindow>,
    fail_create: bool,
    fail_send: bool,
}

/// Fake gateway recording calls and scripting pane content.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_session` fail (for compensation paths).
    pub fn fail_create(&self, fail: bool) {
        self.state.lock().fail_create = fail;
    }

    /// Make `send_raw` fail (window vanished).
    pub fn fail_send(&self, fail: bool) {
        self.state.lock().fail_send = fail;
    }

    /// Script the pane content a window's `capture_pane` returns.
    pub fn set_pane(&self, window: &str, lines: &[&str]) {
        let mut state = self.state.lock();
        let entry = state.windows.entry(window.to_string()).or_default();
        entry.pane = lines.iter().map(|s| s.to_string()).collect();
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MuxCall> {
        self.state.lock().calls.clone()
    }

    /// Snapshot of a window's state.
    pub fn window(&self, window: &str) -> Option<FakeWindow> {
        self.state.lock().windows.get(window).cloned()
    }

    /// Names of sessions currently alive.
    pub fn session_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().sessions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Raw text sent to a window, concatenated.
    pub fn sent_text(&self, window: &str) -> String {
        self.state
            .lock()
            .windows
            .get(window)
            .map(|w| w.sent.concat())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MuxGateway for FakeGateway {
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MuxError> {
        let mut state = self.state.lock();
        state.calls.push(MuxCall::CreateSession {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
            cmd: cmd.to_string(),
            env: env.to_vec(),
        });
        if state.fail_create {
            return Err(MuxError::SpawnFailed("scripted create failure".to_string()));
        }

        let window = format!("{}:0", name);
        state
            .sessions
            .insert(name.to_string(), vec![window.clone()]);
        state.windows.insert(
            window.clone(),
            FakeWindow {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
                cmd: cmd.to_string(),
                env: env.to_vec(),
                ..FakeWindow::default()
            },
        );
        Ok(window)
    }

    async fn has_session(&self, name: &str) -> Result<bool, MuxError> {
        Ok(self.state.lock().sessions.contains_key(name))
    }

    async fn destroy_session(&self, name: &str) -> Result<(), MuxError> {
        let mut state = self.state.lock();
        state.calls.push(MuxCall::DestroySession {
            name: name.to_string(),
        });
        if let Some(windows) = state.sessions.remove(name) {
            for window in windows {
                state.windows.remove(&window);
            }
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
        let mut state = self.state.lock();
        state.calls.push(MuxCall::NewWindow {
            session: session.to_string(),
            name: name.to_string(),
        });
        let Some(windows) = state.sessions.get(session).cloned() else {
            return Err(MuxError::NotFound(session.to_string()));
        };
        let window = format!("{}:{}", session, windows.len());
        if let Some(list) = state.sessions.get_mut(session) {
            list.push(window.clone());
        }
        state.windows.insert(
            window.clone(),
            FakeWindow {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
                cmd: cmd.to_string(),
                ..FakeWindow::default()
            },
        );
        Ok(window)
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, MuxError> {
        let state = self.state.lock();
        let Some(windows) = state.sessions.get(session) else {
            return Err(MuxError::NotFound(session.to_string()));
        };
        Ok(windows
            .iter()
            .enumerate()
            .map(|(i, id)| WindowInfo {
                id: id.clone(),
                name: state
                    .windows
                    .get(id)
                    .map(|w| w.name.clone())
                    .unwrap_or_default(),
                active: i == 0,
            })
            .collect())
    }

    async fn send_raw(&self, window: &str, text: &str) -> Result<(), MuxError> {
        let mut state = self.state.lock();
        state.calls.push(MuxCall::SendRaw {
            window: window.to_string(),
            text: text.to_string(),
        });
        if state.fail_send {
            return Err(MuxError::NotFound(window.to_string()));
        }
        let Some(entry) = state.windows.get_mut(window) else {
            return Err(MuxError::NotFound(window.to_string()));
        };
        entry.sent.push(text.to_string());
        Ok(())
    }

    async fn send_key(&self, window: &str, key: &str) -> Result<(), MuxError> {
        let mut state = self.state.lock();
        state.calls.push(MuxCall::SendKey {
            window: window.to_string(),
            key: key.to_string(),
        });
        let Some(entry) = state.windows.get_mut(window) else {
            return Err(MuxError::NotFound(window.to_string()));
        };
        entry.keys.push(key.to_string());
        Ok(())
    }

    async fn resize(&self, window: &str, cols: u16, rows: u16) -> Result<(), MuxError> {
        let mut state = self.state.lock();
        state.calls.push(MuxCall::Resize {
            window: window.to_string(),
            cols,
            rows,
        });
        let Some(entry) = state.windows.get_mut(window) else {
            return Err(MuxError::NotFound(window.to_string()));
        };
        entry.size = Some((cols, rows));
        Ok(())
    }

    async fn capture_pane(&self, window: &str, max_lines: u32) -> Result<Vec<String>, MuxError> {
        let mut state = self.state.lock();
        state.calls.push(MuxCall::CapturePane {
            window: window.to_string(),
        });
        let Some(entry) = state.windows.get(window) else {
            return Err(MuxError::NotFound(window.to_string()));
        };
        let pane = &entry.pane;
        let keep = max_lines as usize;
        let start = pane.len().saturating_sub(keep);
        Ok(pane[start..].to_vec())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
