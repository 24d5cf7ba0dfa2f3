//! Plan slice: the orchestrator plans a task through a planner session
//! and writes the spec file into the repo.

use crate::prelude::*;
use fm_core::{Run, RunId, RunStatus, Stage, StreamEvent};
use serde_json::json;

fn seed_plan_run(h: &Harness) {
    h.store.with(|state| {
        state.insert_run(Run {
            id: RunId::new("run-plan"),
            project_id: h.project_id(),
            current_stage: Stage::Plan,
            status: RunStatus::Active,
            created_at_ms: 1,
        });
    });
}

#[tokio::test]
async fn plan_slice_writes_the_spec_file() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::at(dir.path());
    seed_plan_run(&h);

    let spec_body = "# Plan\n\nBreak the feature into steps.\n";
    h.model.push_turn(
        "Planning the work.",
        vec![
            fm_adapters::ScriptedModel::tool_use(
                "tu_1",
                "create_session",
                json!({"task_id": "t1", "agent_type": "claude", "role": "planner"}),
            ),
            fm_adapters::ScriptedModel::tool_use(
                "tu_2",
                "send_command",
                json!({"session_id": "gen-3", "text": "Analyze the repository layout"}),
            ),
            fm_adapters::ScriptedModel::tool_use(
                "tu_3",
                "read_session_output",
                json!({"session_id": "gen-3", "lines": 50}),
            ),
            fm_adapters::ScriptedModel::tool_use(
                "tu_4",
                "write_task_spec",
                json!({"task_id": "t1", "path": "docs/specs/plan-task.md", "content": spec_body}),
            ),
        ],
    );
    h.model.push_text("Plan written.");

    let (result, events) = h.chat("Confirm.").await;
    let transcript = result.unwrap();
    assert!(transcript.contains("Plan written."));

    // Tool calls arrive in order, and nothing errored
    assert_eq!(
        tool_calls(&events),
        vec![
            "create_session",
            "send_command",
            "read_session_output",
            "write_task_spec",
        ]
    );
    assert!(tool_errors(&events).is_empty(), "events: {:?}", events);
    assert!(finished_clean(&events));

    // The spec file landed inside the repo
    let spec_path = dir.path().join("docs/specs/plan-task.md");
    assert_eq!(std::fs::read_to_string(spec_path).unwrap(), spec_body);

    // The planner session exists and got the analyze prompt
    let sessions = h.store.with(|s| s.sessions_for_task(&h.task_id()));
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].role, "planner");
    assert_eq!(
        h.gateway.sent_text(&sessions[0].mux_window_id),
        "Analyze the repository layout"
    );

    // The task now records its spec path
    let task = h.store.with(|s| s.task(&h.task_id()).cloned()).unwrap();
    assert_eq!(task.spec_path.as_deref(), Some("docs/specs/plan-task.md"));

    // No error event anywhere in the stream
    assert!(events.iter().all(|e| !matches!(e, StreamEvent::Error { .. })));
}
