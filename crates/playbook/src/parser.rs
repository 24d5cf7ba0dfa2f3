// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playbook parsing (HCL)

use crate::types::Playbook;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur during playbook parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),

    #[error("invalid playbook for {location}: {message}")]
    InvalidFormat { location: String, message: String },
}

/// Agent and role names: lower-case, digits, hyphens and underscores.
fn valid_name(name: &str) -> bool {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    let re = NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").unwrap());
    re.is_match(name)
}

/// Parse a playbook from HCL content and validate it.
pub fn parse_playbook(content: &str) -> Result<Playbook, ParseError> {
    let playbook: Playbook = hcl::from_str(content)?;
    validate(&playbook)?;
    Ok(playbook)
}

/// Content hash used to detect playbook changes between loads.
pub fn playbook_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn validate(playbook: &Playbook) -> Result<(), ParseError> {
    for (name, agent) in &playbook.agents {
        if !valid_name(name) {
            return Err(ParseError::InvalidFormat {
                location: format!("agent \"{}\"", name),
                message: "names are lower-case alphanumerics, - and _".to_string(),
            });
        }
        if agent.command.trim().is_empty() {
            return Err(ParseError::InvalidFormat {
                location: format!("agent \"{}\"", name),
                message: "command must not be empty".to_string(),
            });
        }
    }

    for name in playbook.roles.keys() {
        if !valid_name(name) {
            return Err(ParseError::InvalidFormat {
                location: format!("role \"{}\"", name),
                message: "names are lower-case alphanumerics, - and _".to_string(),
            });
        }
    }

    if let Some(profile) = &playbook.orchestrator {
        if profile.max_tool_rounds == 0 {
            return Err(ParseError::InvalidFormat {
                location: "orchestrator".to_string(),
                message: "max_tool_rounds must be at least 1".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
