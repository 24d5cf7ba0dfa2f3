// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-policy: deny-list over shell text headed for an agent terminal.
//!
//! The policy is a pure predicate: given the text and the session's
//! working directory it either passes or names the rule that tripped.
//! It is a safety net, not a sandbox; the real containment is the
//! choice of working directory (always a worktree or the repo root).
//! Keys and resizes are never policy-checked; only text streams are.

mod rules;
mod words;

pub use rules::{audit_rejection, validate, validate_with_config, PolicyConfig, PolicyError};
pub use words::{split_commands, split_words};
