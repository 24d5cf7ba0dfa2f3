//! Guardrail: stage-gated tools are refused without killing the loop.

use crate::prelude::*;
use fm_adapters::ScriptedModel;
use fm_core::{RunStatus, Stage, StreamEvent};
use serde_json::json;

#[tokio::test]
async fn worktree_creation_is_denied_during_test_stage() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path()).await;
    let h = Harness::at(dir.path());

    // Advance the run into the test stage
    let (run, _) = h.runs.current_run(&h.project_id()).unwrap();
    h.runs
        .transition(
            &run.id,
            &h.project_id(),
            Stage::Test,
            RunStatus::Active,
            json!({"tests": "running"}),
        )
        .unwrap();

    h.model.push_turn(
        "I need a branch for this.",
        vec![ScriptedModel::tool_use(
            "tu_1",
            "create_worktree",
            json!({"branch_name": "feature/too-late"}),
        )],
    );
    h.model.push_text("Noted, staying in test.");

    let (result, events) = h.chat("Fix the flaky test.").await;
    result.unwrap();

    // The denial is a synthetic tool_result error
    assert_eq!(tool_errors(&events), vec!["stage_tool_not_allowed"]);

    // The loop carried on and concluded cleanly
    assert!(matches!(events.last(), Some(StreamEvent::Done)));
    assert!(events
        .iter()
        .all(|e| !matches!(e, StreamEvent::Error { .. })));

    // No worktree was created
    assert!(h
        .store
        .with(|s| s.worktrees_for_project(&h.project_id()))
        .is_empty());
    assert!(!dir.path().join(".worktrees").exists());
}
