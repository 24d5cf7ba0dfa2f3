// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fm_core::NamedKey;
use serde_json::json;

#[test]
fn envelope_flattens_the_request_tag() {
    let envelope = Envelope::new(
        "secret",
        Request::SessionSend {
            id: "s1".to_string(),
            text: "ls".to_string(),
        },
    );
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["token"], "secret");
    assert_eq!(value["type"], "SessionSend");
    assert_eq!(value["id"], "s1");

    let back: Envelope = serde_json::from_value(value).unwrap();
    assert_eq!(back, envelope);
}

#[test]
fn missing_token_defaults_to_empty() {
    let envelope: Envelope = serde_json::from_value(json!({"type": "Ping"})).unwrap();
    assert!(envelope.token.is_empty());
    assert_eq!(envelope.request, Request::Ping);
}

#[test]
fn session_command_carries_a_tagged_op() {
    let envelope: Envelope = serde_json::from_value(json!({
        "token": "t",
        "type": "SessionCommand",
        "id": "s1",
        "op": {"op": "send_key", "key": "Enter"},
    }))
    .unwrap();
    match envelope.request {
        Request::SessionCommand { op, .. } => {
            assert_eq!(op, fm_core::CommandOp::SendKey { key: NamedKey::Enter });
        }
        other => panic!("unexpected request: {:?}", other),
    }
}

#[test]
fn output_defaults() {
    let envelope: Envelope = serde_json::from_value(json!({
        "token": "t",
        "type": "SessionOutput",
        "id": "s1",
    }))
    .unwrap();
    match envelope.request {
        Request::SessionOutput { lines, since_us, .. } => {
            assert_eq!(lines, 200);
            assert_eq!(since_us, 0);
        }
        other => panic!("unexpected request: {:?}", other),
    }
}

#[test]
fn error_response_carries_kind_and_code() {
    let error = fm_engine::EngineError::conflict("task has open issues");
    let response = Response::from_error(&error);
    match response {
        Response::Error { code, kind, message } => {
            assert_eq!(code, 409);
            assert_eq!(kind, "conflict");
            assert_eq!(message, "task has open issues");
        }
        other => panic!("unexpected response: {:?}", other),
    }
}
