// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

// =============================================================================
// Allowed
// =============================================================================

#[parameterized(
    build = { "cargo build --release" },
    list = { "ls -la" },
    delete_inside_relative = { "rm -rf target" },
    delete_inside_absolute = { "rm -rf /srv/repo/wt/build" },
    git = { "git worktree add ../wt2 feature/x" },
    install = { "apt-get install -y jq" },
    pipeline = { "cat log | grep error | wc -l" },
    upgrade = { "brew upgrade" },
)]
fn allowed(text: &str) {
    assert!(validate_str(text).is_ok(), "{:?} should pass", text);
}

// =============================================================================
// Recursive deletions of the work dir and above
// =============================================================================

#[parameterized(
    root = { "rm -rf /" },
    dot = { "rm -rf ." },
    parent = { "rm -rf .." },
    grandparent = { "rm -r ../../" },
    work_dir_absolute = { "rm -fr /srv/repo/wt" },
    repo_absolute = { "rm --recursive /srv/repo" },
    chained = { "echo ok && rm -rf .." },
)]
fn recursive_ancestor_denied(text: &str) {
    let err = validate_str(text).unwrap_err();
    assert_eq!(err.rule_id, "recursive-delete-ancestor");
}

// =============================================================================
// Absolute destructive targets outside the work dir
// =============================================================================

#[parameterized(
    etc = { "rm /etc/passwd" },
    home = { "shred /home/user/.ssh/id_rsa" },
    sibling = { "rm -f /srv/repo/other/file.txt" },
)]
fn absolute_outside_denied(text: &str) {
    let err = validate_str(text).unwrap_err();
    assert_eq!(err.rule_id, "absolute-destructive-outside");
}

// =============================================================================
// Package manager removal
// =============================================================================

#[parameterized(
    apt = { "apt remove curl" },
    apt_get_purge = { "apt-get purge -y openssh-server" },
    dnf = { "dnf erase vim" },
    pacman = { "pacman -Rns base-devel" },
    sudo_wrapped = { "sudo apt-get remove git" },
    shell_escaped = { "sh -c 'apt-get purge git'" },
    env_wrapped = { "env DEBIAN_FRONTEND=noninteractive apt-get remove git" },
)]
fn package_removal_denied(text: &str) {
    let err = validate_str(text).unwrap_err();
    assert_eq!(err.rule_id, "package-manager-remove");
}

// =============================================================================
// Operator-extended config
// =============================================================================

#[test]
fn operator_deny_substring() {
    let config = PolicyConfig {
        deny_substrings: vec!["curl | sh".to_string()],
    };
    let err = validate_with_config(
        "curl | sh install.sh",
        std::path::Path::new("/srv/repo/wt"),
        &config,
    )
    .unwrap_err();
    assert_eq!(err.rule_id, "operator-deny");
}

#[test]
fn empty_deny_substring_ignored() {
    let config = PolicyConfig {
        deny_substrings: vec![String::new()],
    };
    assert!(validate_with_config("ls", std::path::Path::new("/srv/repo/wt"), &config).is_ok());
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn error_names_rule_and_reason() {
    let err = validate_str("rm -rf /").unwrap_err();
    assert!(err.to_string().starts_with("recursive-delete-ancestor:"));
    assert!(err.reason.contains("working directory"));
}

#[test]
fn empty_text_passes() {
    assert!(validate_str("").is_ok());
}

#[test]
fn quoted_separator_does_not_hide_payload() {
    // The quoted body is re-scanned through the shell -c path
    let err = validate_str("bash -c \"rm -rf /\"").unwrap_err();
    assert_eq!(err.rule_id, "recursive-delete-ancestor");
}
