// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const BASIC: &str = r#"
agent "claude" {
  command = "claude --dangerously-skip-permissions"
  env = {
    FORCE_COLOR = "1"
  }
}

role "coder" {
  strict_review = true
}

role "planner" {}

orchestrator {
  notify_on_blocked = false
  max_tool_rounds   = 8
  model             = "claude-sonnet-4-5"
}
"#;

#[test]
fn parses_basic_playbook() {
    let playbook = parse_playbook(BASIC).unwrap();
    let claude = playbook.get_agent("claude").unwrap();
    assert_eq!(claude.command, "claude --dangerously-skip-permissions");
    assert_eq!(claude.env.get("FORCE_COLOR").map(String::as_str), Some("1"));

    assert!(playbook.is_strict_role("coder"));
    assert!(!playbook.is_strict_role("planner"));
    assert!(!playbook.is_strict_role("unknown"));

    let profile = playbook.profile();
    assert!(!profile.notify_on_blocked);
    assert_eq!(profile.max_tool_rounds, 8);
    assert_eq!(profile.model, "claude-sonnet-4-5");
}

#[test]
fn empty_playbook_parses() {
    let playbook = parse_playbook("").unwrap();
    assert!(playbook.agents.is_empty());
    let profile = playbook.profile();
    assert!(profile.notify_on_blocked);
    assert_eq!(profile.max_tool_rounds, 16);
}

#[test]
fn empty_command_rejected() {
    let err = parse_playbook("agent \"claude\" {\n  command = \"  \"\n}\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidFormat { .. }));
    assert!(err.to_string().contains("command must not be empty"));
}

#[parameterized(
    uppercase = { "Claude" },
    spaces = { "my agent" },
    slash = { "a/b" },
    empty = { "" },
)]
fn bad_agent_names_rejected(name: &str) {
    let hcl = format!("agent \"{}\" {{\n  command = \"claude\"\n}}\n", name);
    assert!(parse_playbook(&hcl).is_err(), "{:?} should be rejected", name);
}

#[test]
fn zero_rounds_rejected() {
    let err = parse_playbook("orchestrator {\n  max_tool_rounds = 0\n}\n").unwrap_err();
    assert!(err.to_string().contains("max_tool_rounds"));
}

#[test]
fn malformed_hcl_is_a_parse_error() {
    let err = parse_playbook("agent \"x\" {").unwrap_err();
    assert!(matches!(err, ParseError::Hcl(_)));
}

#[test]
fn hash_is_stable_and_content_sensitive() {
    let a = playbook_hash(BASIC);
    let b = playbook_hash(BASIC);
    let c = playbook_hash("agent \"other\" { command = \"x\" }");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
}
