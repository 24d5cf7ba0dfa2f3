// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Resolve data directory: FM_DATA_DIR > XDG_STATE_HOME/foreman > ~/.local/state/foreman
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FM_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("foreman"));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local/state/foreman"))
}

/// Shared bearer token for the control plane.
pub fn token() -> Option<String> {
    std::env::var("FM_TOKEN").ok().filter(|t| !t.is_empty())
}

/// WebSocket listen address (host:port).
pub fn listen_addr() -> String {
    std::env::var("FM_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:7171".to_string())
}

/// LLM provider endpoint and key.
pub fn model_base_url() -> String {
    std::env::var("FM_MODEL_BASE_URL").unwrap_or_else(|_| "https://api.anthropic.com".to_string())
}

pub fn model_api_key() -> String {
    std::env::var("FM_MODEL_API_KEY")
        .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
        .unwrap_or_default()
}

/// Pre-created multiplexer session to attach instead of spawning new ones.
pub fn mux_session() -> Option<String> {
    std::env::var("FM_MUX_SESSION").ok().filter(|s| !s.is_empty())
}
