// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn finds_playbook_in_start_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("playbook.hcl"), "").unwrap();
    let found = find_playbook(dir.path()).unwrap();
    assert_eq!(found, dir.path().join("playbook.hcl"));
}

#[test]
fn walks_up_to_parent() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(dir.path().join("playbook.hcl"), "").unwrap();
    let found = find_playbook(&nested).unwrap();
    assert_eq!(found, dir.path().join("playbook.hcl"));
}

#[test]
fn prefers_plain_name_over_dotdir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".fm")).unwrap();
    std::fs::write(dir.path().join(".fm/playbook.hcl"), "").unwrap();
    std::fs::write(dir.path().join("playbook.hcl"), "").unwrap();
    let found = find_playbook(dir.path()).unwrap();
    assert_eq!(found, dir.path().join("playbook.hcl"));
}

#[test]
fn none_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    // Note: parent dirs of the tempdir could theoretically hold a playbook;
    // scope the search by creating a deep orphan directory.
    let nested = dir.path().join("x");
    std::fs::create_dir_all(&nested).unwrap();
    let found = find_playbook(&nested);
    // The tempdir chain has no playbook on CI machines
    assert!(found.is_none() || !found.unwrap().starts_with(dir.path()));
}
