// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-playbook: HCL playbooks binding agent types, roles, and the
//! orchestrator profile to a project.
//!
//! A playbook declares which agent TUIs may be spawned (and how), which
//! roles participate in the strict review contract, and the per-project
//! orchestrator defaults.
//!
//! ```hcl
//! agent "claude" {
//!   command = "claude --dangerously-skip-permissions"
//!   env     = { FORCE_COLOR = "1" }
//! }
//!
//! role "coder" {
//!   strict_review = true
//! }
//!
//! orchestrator {
//!   notify_on_blocked = true
//!   max_tool_rounds   = 16
//!   model             = "claude-sonnet-4-5"
//! }
//! ```

mod find;
mod parser;
mod types;

pub use find::{find_playbook, PLAYBOOK_FILE_NAMES};
pub use parser::{parse_playbook, playbook_hash, ParseError};
pub use types::{AgentTypeDef, Playbook, ProfileDef, RoleDef};
