// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn cycle_status_names() {
    assert_eq!(
        CycleStatus::ReviewChangesRequested.to_string(),
        "review_changes_requested"
    );
    assert_eq!(CycleStatus::ReviewPassed.to_string(), "review_passed");
}

#[test]
fn severity_is_ordered() {
    assert!(IssueSeverity::Low < IssueSeverity::Medium);
    assert!(IssueSeverity::Medium < IssueSeverity::High);
    assert!(IssueSeverity::High < IssueSeverity::Critical);
}

#[test]
fn cycle_serde_roundtrip() {
    let cycle = ReviewCycle {
        id: ReviewCycleId::new("rc1"),
        task_id: TaskId::new("t1"),
        iteration: 3,
        commit_hash: "deadbeef".to_string(),
        status: CycleStatus::ReviewPending,
        created_at_ms: 10,
    };
    let json = serde_json::to_string(&cycle).unwrap();
    let back: ReviewCycle = serde_json::from_str(&json).unwrap();
    assert_eq!(back.iteration, 3);
    assert_eq!(back.status, CycleStatus::ReviewPending);
}
