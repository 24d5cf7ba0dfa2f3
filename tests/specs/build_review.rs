//! Build slice: worktree, coder session, review loop, merge gate.

use crate::prelude::*;
use fm_adapters::ScriptedModel;
use fm_core::{StreamEvent, WorktreeStatus};
use serde_json::json;

fn result_for<'a>(events: &'a [StreamEvent], id: &str) -> &'a serde_json::Value {
    events
        .iter()
        .find_map(|e| match e {
            StreamEvent::ToolResult {
                id: got,
                result: Some(result),
                ..
            } if got == id => Some(result),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no result for {}", id))
}

#[tokio::test]
async fn build_slice_runs_the_review_loop_to_merge() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path()).await;
    let h = Harness::at(dir.path());

    h.model.push_turn(
        "Building through review.",
        vec![
            ScriptedModel::tool_use(
                "tu_1",
                "create_worktree",
                json!({"task_id": "t1", "branch_name": "feature/b"}),
            ),
            ScriptedModel::tool_use(
                "tu_2",
                "create_session",
                json!({"task_id": "t1", "agent_type": "claude", "role": "coder"}),
            ),
            ScriptedModel::tool_use(
                "tu_3",
                "send_command",
                json!({"session_id": "gen-5", "text": "Implement the feature"}),
            ),
            ScriptedModel::tool_use(
                "tu_4",
                "create_review_cycle",
                json!({"task_id": "t1", "commit_hash": "abc"}),
            ),
            ScriptedModel::tool_use(
                "tu_5",
                "create_review_issue",
                json!({"cycle_id": "gen-9", "severity": "high", "summary": "missing tests"}),
            ),
            ScriptedModel::tool_use(
                "tu_6",
                "get_review_loop_status",
                json!({"task_id": "t1"}),
            ),
            ScriptedModel::tool_use(
                "tu_7",
                "update_review_issue",
                json!({"issue_id": "gen-11", "status": "resolved", "resolution": "tests added"}),
            ),
            ScriptedModel::tool_use(
                "tu_8",
                "get_review_loop_status",
                json!({"task_id": "t1"}),
            ),
            ScriptedModel::tool_use(
                "tu_9",
                "merge_worktree",
                json!({"worktree_id": "gen-3"}),
            ),
        ],
    );
    h.model.push_text("Merged and clean.");

    let (result, events) = h.chat("Build it.").await;
    result.unwrap();
    assert!(tool_errors(&events).is_empty(), "events: {:?}", events);
    assert!(finished_clean(&events));

    // The review loop was visibly unsatisfied, then satisfied
    assert_eq!(result_for(&events, "tu_6")["needs_fix"], true);
    assert_eq!(result_for(&events, "tu_8")["passed"], true);

    // The merge reported success
    assert_eq!(result_for(&events, "tu_9")["merged"], true);

    // Worktree is merged in the store
    let worktrees = h.store.with(|s| s.worktrees_for_project(&h.project_id()));
    assert_eq!(worktrees.len(), 1);
    assert_eq!(worktrees[0].status, WorktreeStatus::Merged);

    // With the loop passed, the task may now be completed
    let task = h.review.complete_task(&h.task_id()).unwrap();
    assert!(task.status.is_done());
}
