// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{kernel, kernel_at, Kernel};
use fm_adapters::ScriptedModel;
use fm_core::{HistoryRole, StreamEvent};
use serde_json::json;

async fn run_chat(k: &Kernel, message: &str) -> (Result<String, EngineError>, Vec<StreamEvent>) {
    let (tx, mut rx) = mpsc::channel(64);
    let result = k
        .orch
        .chat(&ProjectId::new("p1"), message, tx, CancellationToken::new())
        .await;
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (result, events)
}

fn tool_calls(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ToolCall { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn tool_errors(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ToolResult {
                error: Some(error), ..
            } => Some(error.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn plain_reply_ends_after_one_round() {
    let k = kernel();
    k.model.push_text("Nothing to do.");

    let (result, events) = run_chat(&k, "Status?").await;
    assert_eq!(result.unwrap(), "Nothing to do.");

    assert!(matches!(events[0], StreamEvent::Token { .. }));
    assert_eq!(*events.last().unwrap(), StreamEvent::Done);

    // History: user then assistant, oldest first
    let history = k
        .store
        .with(|s| s.history_for_project(&ProjectId::new("p1")));
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, HistoryRole::User);
    assert_eq!(history[0].content, "Status?");
    assert_eq!(history[1].role, HistoryRole::Assistant);
}

#[tokio::test]
async fn tool_round_executes_and_feeds_back() {
    let k = kernel();
    k.model.push_turn(
        "Checking the run.",
        vec![ScriptedModel::tool_use("tu_1", "get_current_run", json!({}))],
    );
    k.model.push_text("All set.");

    let (result, events) = run_chat(&k, "Kick off.").await;
    assert!(result.unwrap().contains("All set."));
    assert_eq!(tool_calls(&events), vec!["get_current_run"]);
    assert!(tool_errors(&events).is_empty());

    // The tool result went into history as a tool message
    let history = k
        .store
        .with(|s| s.history_for_project(&ProjectId::new("p1")));
    assert!(history.iter().any(|m| m.role == HistoryRole::Tool));

    // And the scripted model saw the tool result in round two
    let requests = k.model.requests();
    assert_eq!(requests.len(), 2);
    let last = &requests[1].messages;
    assert!(matches!(
        last.last().unwrap().content[0],
        fm_adapters::ContentBlock::ToolResult { .. }
    ));
}

#[tokio::test]
async fn stage_gate_denies_out_of_stage_tools() {
    let k = kernel();
    // Move the run to the test stage
    let project_id = ProjectId::new("p1");
    let (run, _) = k.runs.current_run(&project_id).unwrap();
    k.runs
        .transition(&run.id, &project_id, fm_core::Stage::Test, fm_core::RunStatus::Active, json!({}))
        .unwrap();

    k.model.push_turn(
        "Let me branch.",
        vec![ScriptedModel::tool_use(
            "tu_1",
            "create_worktree",
            json!({"branch_name": "feature/late"}),
        )],
    );
    k.model.push_text("Understood.");

    let (result, events) = run_chat(&k, "Make a worktree.").await;
    result.unwrap();

    assert_eq!(tool_errors(&events), vec![tools::STAGE_DENIED]);
    // The loop continued to a second round and finished cleanly
    assert_eq!(*events.last().unwrap(), StreamEvent::Done);
    // No worktree was created
    assert!(k
        .store
        .with(|s| s.worktrees_for_project(&project_id))
        .is_empty());
}

#[tokio::test]
async fn unknown_tool_is_an_error_not_a_crash() {
    let k = kernel();
    k.model.push_turn(
        "",
        vec![ScriptedModel::tool_use("tu_1", "launch_rockets", json!({}))],
    );
    k.model.push_text("Sorry.");

    let (result, events) = run_chat(&k, "Do something odd.").await;
    result.unwrap();
    let errors = tool_errors(&events);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("unknown tool"));
}

#[tokio::test]
async fn provider_failure_closes_with_error() {
    let k = kernel();
    k.model.fail_next("upstream 529");

    let (result, events) = run_chat(&k, "Hello?").await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), fm_core::ErrorKind::BadGateway);
    assert!(matches!(
        events.last().unwrap(),
        StreamEvent::Error { .. }
    ));
}

#[tokio::test]
async fn round_bound_stops_runaway_loops() {
    let k = kernel();
    k.store.with(|state| {
        let mut profile = state.profile(&ProjectId::new("p1")).unwrap().clone();
        profile.max_tool_rounds = 2;
        state.update_profile(profile);
    });
    for i in 0..5 {
        k.model.push_turn(
            "",
            vec![ScriptedModel::tool_use(
                &format!("tu_{}", i),
                "get_current_run",
                json!({}),
            )],
        );
    }

    let (result, events) = run_chat(&k, "Loop forever.").await;
    result.unwrap();
    assert_eq!(tool_calls(&events).len(), 2);
    assert_eq!(*events.last().unwrap(), StreamEvent::Done);
}

#[tokio::test]
async fn cancellation_stops_after_current_tool() {
    let k = kernel();
    k.model.push_turn(
        "",
        vec![
            ScriptedModel::tool_use("tu_1", "get_current_run", json!({})),
            ScriptedModel::tool_use("tu_2", "get_project_status", json!({})),
        ],
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    // Cancel before the round: the loop refuses to start another round
    let (tx, mut rx) = mpsc::channel(64);
    let result = k
        .orch
        .chat(&ProjectId::new("p1"), "Cancelled work.", tx, cancel)
        .await;
    assert!(matches!(result.unwrap_err(), EngineError::Cancelled));

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        *events.last().unwrap(),
        StreamEvent::Error {
            error: "cancelled".to_string()
        }
    );
}

#[tokio::test]
async fn empty_message_is_invalid() {
    let k = kernel();
    let (result, _) = run_chat(&k, "   ").await;
    assert_eq!(
        result.unwrap_err().kind(),
        fm_core::ErrorKind::InvalidArgument
    );
}

#[tokio::test]
async fn concurrent_chats_serialize_per_project() {
    let dir = tempfile::tempdir().unwrap();
    let k = kernel_at(dir.path());
    k.model.push_text("first reply");
    k.model.push_text("second reply");

    let orch = k.orch.clone();
    let a = tokio::spawn(async move {
        let (tx, _rx) = mpsc::channel(64);
        orch.chat(&ProjectId::new("p1"), "first", tx, CancellationToken::new())
            .await
    });
    let orch = k.orch.clone();
    let b = tokio::spawn(async move {
        let (tx, _rx) = mpsc::channel(64);
        orch.chat(&ProjectId::new("p1"), "second", tx, CancellationToken::new())
            .await
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // History linearizes into whole rounds: each user message is
    // immediately followed by its assistant reply.
    let history = k
        .store
        .with(|s| s.history_for_project(&ProjectId::new("p1")));
    assert_eq!(history.len(), 4);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, HistoryRole::User);
        assert_eq!(pair[1].role, HistoryRole::Assistant);
    }
}

#[tokio::test]
async fn orchestrator_events_mirror_to_the_hub() {
    let k = kernel();
    let mut sub = k
        .hub
        .subscribe(vec![crate::hub::Topic::Orchestrator("p1".to_string())]);
    k.model.push_text("mirrored");

    run_chat(&k, "hello").await.0.unwrap();

    let mut saw_token = false;
    let mut saw_done = false;
    while let Some(event) = sub.try_recv() {
        if let crate::hub::HubEvent::Orchestrator { event, .. } = event {
            match event {
                StreamEvent::Token { .. } => saw_token = true,
                StreamEvent::Done => saw_done = true,
                _ => {}
            }
        }
    }
    assert!(saw_token);
    assert!(saw_done);
}
