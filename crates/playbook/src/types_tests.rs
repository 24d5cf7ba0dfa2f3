// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builtin_has_strict_review_roles() {
    let playbook = Playbook::builtin();
    assert!(playbook.get_agent("claude").is_some());
    for role in ["coder", "reviewer", "qa"] {
        assert!(playbook.is_strict_role(role), "{} should be strict", role);
    }
    assert!(!playbook.is_strict_role("planner"));
}

#[test]
fn profile_defaults() {
    let profile = Playbook::default().profile();
    assert!(profile.notify_on_blocked);
    assert_eq!(profile.max_tool_rounds, 16);
    assert!(profile.model.is_empty());
}
