// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::test_ctx::{test_ctx, TestCtx, TEST_TOKEN};
use super::*;
use crate::protocol::{Request, Response};
use fm_adapters::ScriptedModel;
use serde_json::json;

async fn request(ctx: &TestCtx, request: Request) -> Response {
    handle_request(request, TEST_TOKEN, ctx).await
}

fn expect_error(response: Response, code: u16) {
    match response {
        Response::Error { code: got, .. } => assert_eq!(got, code),
        other => panic!("expected error {}, got {:?}", code, other),
    }
}

async fn seed_project(ctx: &TestCtx, dir: &std::path::Path) -> String {
    match request(
        ctx,
        Request::ProjectCreate {
            name: "demo".to_string(),
            repo_path: dir.to_string_lossy().to_string(),
        },
    )
    .await
    {
        Response::Project { project } => project.id.0,
        other => panic!("unexpected response: {:?}", other),
    }
}

async fn seed_task(ctx: &TestCtx, project_id: &str) -> String {
    match request(
        ctx,
        Request::TaskCreate {
            project_id: project_id.to_string(),
            title: "build the feature".to_string(),
            description: String::new(),
            depends_on: Vec::new(),
        },
    )
    .await
    {
        Response::Task { task } => task.id.0,
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn ping_and_hello_skip_auth() {
    let (ctx, _, _) = test_ctx();
    assert!(matches!(
        handle_request(Request::Ping, "", &ctx).await,
        Response::Pong
    ));
    assert!(matches!(
        handle_request(
            Request::Hello {
                version: "x".to_string()
            },
            "wrong-token",
            &ctx
        )
        .await,
        Response::Hello { .. }
    ));
}

#[tokio::test]
async fn bad_token_is_unauthorized() {
    let (ctx, _, _) = test_ctx();
    let response = handle_request(Request::ProjectList, "wrong", &ctx).await;
    expect_error(response, 401);
}

#[tokio::test]
async fn project_crud_roundtrip() {
    let (ctx, _, _) = test_ctx();
    let dir = tempfile::tempdir().unwrap();
    let id = seed_project(&ctx, dir.path()).await;

    match request(&ctx, Request::ProjectList).await {
        Response::Projects { projects } => {
            assert_eq!(projects.len(), 1);
            assert_eq!(projects[0].name, "demo");
        }
        other => panic!("unexpected response: {:?}", other),
    }

    assert!(matches!(
        request(&ctx, Request::ProjectGet { id: id.clone() }).await,
        Response::Project { .. }
    ));
    assert!(matches!(
        request(&ctx, Request::ProjectDelete { id: id.clone() }).await,
        Response::Ok
    ));
    expect_error(request(&ctx, Request::ProjectGet { id }).await, 404);
}

#[tokio::test]
async fn project_create_validates_path() {
    let (ctx, _, _) = test_ctx();
    expect_error(
        request(
            &ctx,
            Request::ProjectCreate {
                name: "demo".to_string(),
                repo_path: "relative/path".to_string(),
            },
        )
        .await,
        400,
    );
}

#[tokio::test]
async fn session_lifecycle_over_ipc() {
    let (ctx, gateway, _) = test_ctx();
    let dir = tempfile::tempdir().unwrap();
    let project_id = seed_project(&ctx, dir.path()).await;
    let task_id = seed_task(&ctx, &project_id).await;

    let session = match request(
        &ctx,
        Request::SessionCreate {
            task_id: task_id.clone(),
            agent_type: "claude".to_string(),
            role: "coder".to_string(),
        },
    )
    .await
    {
        Response::Session { session } => session,
        other => panic!("unexpected response: {:?}", other),
    };

    // Send text, then read the output back
    assert!(matches!(
        request(
            &ctx,
            Request::SessionSend {
                id: session.id.0.clone(),
                text: "echo hi".to_string(),
            },
        )
        .await,
        Response::Command { .. }
    ));
    assert_eq!(gateway.sent_text(&session.mux_window_id), "echo hi");

    gateway.set_pane(&session.mux_window_id, &["$ echo hi", "hi"]);
    match request(
        &ctx,
        Request::SessionOutput {
            id: session.id.0.clone(),
            lines: 10,
            since_us: 0,
        },
    )
    .await
    {
        Response::Output { frames } => {
            assert_eq!(frames.len(), 2);
            assert_eq!(frames[1].text, "hi");
        }
        other => panic!("unexpected response: {:?}", other),
    }

    // Empty text is a 400
    expect_error(
        request(
            &ctx,
            Request::SessionSend {
                id: session.id.0.clone(),
                text: String::new(),
            },
        )
        .await,
        400,
    );

    // Policy rejection is a 403
    expect_error(
        request(
            &ctx,
            Request::SessionSend {
                id: session.id.0.clone(),
                text: "sudo apt-get remove git".to_string(),
            },
        )
        .await,
        403,
    );

    // Close gate: strict coder role without a passed review is a 409
    expect_error(
        request(
            &ctx,
            Request::SessionDelete {
                id: session.id.0.clone(),
            },
        )
        .await,
        409,
    );
    match request(
        &ctx,
        Request::SessionCloseCheck {
            id: session.id.0.clone(),
        },
    )
    .await
    {
        Response::CloseCheck { gate } => assert!(!gate.can_close),
        other => panic!("unexpected response: {:?}", other),
    }

    // Takeover toggling
    match request(
        &ctx,
        Request::SessionTakeover {
            id: session.id.0.clone(),
            human_takeover: true,
        },
    )
    .await
    {
        Response::Session { session } => {
            assert_eq!(session.status, fm_core::SessionStatus::HumanTakeover)
        }
        other => panic!("unexpected response: {:?}", other),
    }
    match request(
        &ctx,
        Request::SessionIdle {
            id: session.id.0.clone(),
        },
    )
    .await
    {
        Response::Idle { info } => {
            assert!(!info.idle);
            assert!(info.human_takeover);
        }
        other => panic!("unexpected response: {:?}", other),
    }
    match request(
        &ctx,
        Request::SessionTakeover {
            id: session.id.0.clone(),
            human_takeover: false,
        },
    )
    .await
    {
        Response::Session { session } => {
            assert_eq!(session.status, fm_core::SessionStatus::Idle)
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn unknown_ids_are_404() {
    let (ctx, _, _) = test_ctx();
    expect_error(
        request(
            &ctx,
            Request::SessionIdle {
                id: "ghost".to_string(),
            },
        )
        .await,
        404,
    );
    expect_error(
        request(
            &ctx,
            Request::TaskComplete {
                id: "ghost".to_string(),
            },
        )
        .await,
        404,
    );
}

#[tokio::test]
async fn chat_returns_response_and_events() {
    let (ctx, _, model) = test_ctx();
    let dir = tempfile::tempdir().unwrap();
    let project_id = seed_project(&ctx, dir.path()).await;
    model.push_turn(
        "Looking at the run.",
        vec![ScriptedModel::tool_use("tu_1", "get_current_run", json!({}))],
    );
    model.push_text("Done looking.");

    match request(
        &ctx,
        Request::Chat {
            project_id: project_id.clone(),
            message: "status please".to_string(),
        },
    )
    .await
    {
        Response::Chat { response, events } => {
            assert!(response.contains("Done looking."));
            assert!(events
                .iter()
                .any(|e| matches!(e, fm_core::StreamEvent::ToolCall { .. })));
            assert!(matches!(events.last(), Some(fm_core::StreamEvent::Done)));
        }
        other => panic!("unexpected response: {:?}", other),
    }

    // The report is available afterwards
    match request(&ctx, Request::Report { project_id }).await {
        Response::Report { report } => {
            assert_eq!(report.review_state, "not_started");
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn status_reports_basics() {
    let (ctx, _, _) = test_ctx();
    match request(&ctx, Request::Status).await {
        Response::Status {
            projects,
            playbook_hash,
            ..
        } => {
            assert_eq!(projects, 0);
            assert_eq!(playbook_hash, "testhash");
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn shutdown_notifies() {
    let (ctx, _, _) = test_ctx();
    let notified = ctx.shutdown.clone();
    let wait = tokio::spawn(async move { notified.notified().await });
    assert!(matches!(
        request(&ctx, Request::Shutdown).await,
        Response::ShuttingDown
    ));
    wait.await.unwrap();
}
