// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deny rules over proposed shell text.

use crate::words::{split_commands, split_words};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// A policy rejection, naming the rule that tripped.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{rule_id}: {reason}")]
pub struct PolicyError {
    pub rule_id: String,
    pub reason: String,
}

impl PolicyError {
    fn new(rule_id: &str, reason: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Configuration for the policy: operator-extendable deny substrings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Extra case-sensitive substrings that reject the whole text.
    #[serde(default)]
    pub deny_substrings: Vec<String>,
}

/// Validate proposed shell text against the built-in rules.
pub fn validate(text: &str, work_dir: &Path) -> Result<(), PolicyError> {
    validate_with_config(text, work_dir, &PolicyConfig::default())
}

/// Validate with operator-extended configuration.
pub fn validate_with_config(
    text: &str,
    work_dir: &Path,
    config: &PolicyConfig,
) -> Result<(), PolicyError> {
    for needle in &config.deny_substrings {
        if !needle.is_empty() && text.contains(needle.as_str()) {
            return Err(PolicyError::new(
                "operator-deny",
                format!("text matches operator deny pattern {:?}", needle),
            ));
        }
    }

    for words in split_commands(text) {
        check_command(&words, work_dir)?;
    }

    Ok(())
}

/// Emit the structured audit record for a rejection.
///
/// The log sink is external; this only guarantees the record's fields.
pub fn audit_rejection(work_dir: &Path, session_id: &str, text: &str, error: &PolicyError) {
    tracing::warn!(
        work_dir = %work_dir.display(),
        session_id,
        text,
        rule_id = %error.rule_id,
        reason = %error.reason,
        "command rejected by policy"
    );
}

/// Wrapper prefixes that hand their tail to another command.
const WRAPPERS: &[&str] = &["sudo", "env", "command", "exec", "nohup", "nice", "time"];

/// Package managers whose remove/purge subcommands are denied.
const PACKAGE_MANAGERS: &[&str] = &[
    "apt", "apt-get", "aptitude", "dpkg", "yum", "dnf", "zypper", "apk", "brew", "pacman",
];

const REMOVE_SUBCOMMANDS: &[&str] = &["remove", "purge", "autoremove", "erase"];

/// Commands that delete or overwrite what they are pointed at.
const DESTRUCTIVE: &[&str] = &["rm", "rmdir", "shred", "unlink", "truncate"];

fn check_command(words: &[String], work_dir: &Path) -> Result<(), PolicyError> {
    let words = strip_wrappers(words);
    let Some(head) = words.first() else {
        return Ok(());
    };
    let name = base_name(head);

    // Re-scan `sh -c '...'` payloads instead of trusting the quoting
    if matches!(name, "sh" | "bash" | "zsh" | "dash") {
        for (i, word) in words.iter().enumerate() {
            if *word == "-c" {
                if let Some(payload) = words.get(i + 1) {
                    for inner in split_commands(payload) {
                        check_command(&inner, work_dir)?;
                    }
                }
            }
        }
        return Ok(());
    }

    if PACKAGE_MANAGERS.contains(&name) {
        return check_package_manager(name, &words[1..]);
    }

    if DESTRUCTIVE.contains(&name) {
        return check_destructive(name, &words[1..], work_dir);
    }

    Ok(())
}

fn check_package_manager(name: &str, args: &[&String]) -> Result<(), PolicyError> {
    let sub = args
        .iter()
        .map(|a| a.as_str())
        .find(|a| !a.starts_with('-'));
    if let Some(sub) = sub {
        if REMOVE_SUBCOMMANDS.contains(&sub) {
            return Err(PolicyError::new(
                "package-manager-remove",
                format!("{} {} uninstalls system packages", name, sub),
            ));
        }
    }
    // pacman spells removal as a flag
    if name == "pacman" && args.iter().any(|a| a.starts_with("-R")) {
        return Err(PolicyError::new(
            "package-manager-remove",
            "pacman -R uninstalls system packages",
        ));
    }
    Ok(())
}

fn check_destructive(name: &str, args: &[&String], work_dir: &Path) -> Result<(), PolicyError> {
    let recursive = name != "rm"
        || args.iter().any(|a| {
            a.as_str() == "--recursive"
                || (a.starts_with('-') && !a.starts_with("--") && a.contains('r'))
        });

    for arg in args {
        if arg.starts_with('-') {
            continue;
        }
        let target = resolve_lexical(Path::new(arg.as_str()), work_dir);

        // Recursive deletion of the work dir or anything above it
        if recursive && work_dir.starts_with(&target) {
            return Err(PolicyError::new(
                "recursive-delete-ancestor",
                format!(
                    "{} targets {}, which contains the working directory",
                    name,
                    target.display()
                ),
            ));
        }

        // Absolute destructive target outside the work dir
        if Path::new(arg.as_str()).is_absolute() && !target.starts_with(work_dir) {
            return Err(PolicyError::new(
                "absolute-destructive-outside",
                format!(
                    "{} targets {} outside the working directory",
                    name,
                    target.display()
                ),
            ));
        }
    }

    Ok(())
}

/// Peel wrapper commands (`sudo`, `env VAR=x`, …) off the front.
fn strip_wrappers(words: &[String]) -> Vec<&String> {
    let mut rest: &[String] = words;
    loop {
        let Some(head) = rest.first() else {
            return Vec::new();
        };
        if WRAPPERS.contains(&base_name(head)) {
            rest = &rest[1..];
            // env's leading VAR=value assignments are not the command
            while rest
                .first()
                .map(|w| w.contains('=') && !w.starts_with('-'))
                .unwrap_or(false)
            {
                rest = &rest[1..];
            }
            continue;
        }
        return rest.iter().collect();
    }
}

fn base_name(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}

/// Resolve a path lexically against the work dir: no filesystem access,
/// `.` and `..` are folded component-wise.
fn resolve_lexical(path: &Path, work_dir: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    };

    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
fn validate_str(text: &str) -> Result<(), PolicyError> {
    validate(text, Path::new("/srv/repo/wt"))
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
