// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn status_display() {
    assert_eq!(WorktreeStatus::Active.to_string(), "active");
    assert_eq!(WorktreeStatus::Merged.to_string(), "merged");
    assert_eq!(WorktreeStatus::Conflict.to_string(), "conflict");
}

#[test]
fn serde_roundtrip_keeps_task_link() {
    let wt = Worktree {
        id: WorktreeId::new("w1"),
        project_id: ProjectId::new("p1"),
        task_id: Some(TaskId::new("t1")),
        branch_name: "feature/login".to_string(),
        path: "/srv/repo/.worktrees/t1".into(),
        status: WorktreeStatus::Active,
        created_at_ms: 5,
    };
    let json = serde_json::to_string(&wt).unwrap();
    let back: Worktree = serde_json::from_str(&json).unwrap();
    assert_eq!(back.task_id, Some(TaskId::new("t1")));
}
