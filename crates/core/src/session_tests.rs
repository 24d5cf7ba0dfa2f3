// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    enter = { "Enter", NamedKey::Enter },
    ctrl_c = { "C-c", NamedKey::CtrlC },
    ctrl_d = { "C-d", NamedKey::CtrlD },
    escape = { "Escape", NamedKey::Escape },
    up = { "Up", NamedKey::Up },
    down = { "Down", NamedKey::Down },
    left = { "Left", NamedKey::Left },
    right = { "Right", NamedKey::Right },
)]
fn named_keys_roundtrip(name: &str, key: NamedKey) {
    assert_eq!(name.parse::<NamedKey>(), Ok(key));
    assert_eq!(key.mux_name(), name);
}

#[parameterized(
    lowercase = { "enter" },
    function = { "F1" },
    empty = { "" },
    word = { "Backspace" },
)]
fn unknown_keys_rejected(name: &str) {
    assert!(name.parse::<NamedKey>().is_err());
}

#[test]
fn idle_is_strict() {
    assert!(SessionStatus::Idle.is_idle());
    assert!(!SessionStatus::WaitingReview.is_idle());
    assert!(!SessionStatus::HumanTakeover.is_idle());
    assert!(!SessionStatus::Working.is_idle());
}

#[test]
fn command_status_is_monotone() {
    let order = [
        CommandStatus::Queued,
        CommandStatus::Sent,
        CommandStatus::Acked,
        CommandStatus::Completed,
    ];
    for pair in order.windows(2) {
        assert!(pair[0].ordinal() < pair[1].ordinal());
    }
    assert!(CommandStatus::Failed.is_terminal());
    assert!(CommandStatus::Completed.is_terminal());
    assert!(!CommandStatus::Acked.is_terminal());
}

#[test]
fn new_command_starts_queued() {
    let cmd = SessionCommand::new(
        CommandId::new("c1"),
        SessionId::new("s1"),
        CommandOp::SendText {
            text: "ls".to_string(),
        },
        100,
    );
    assert_eq!(cmd.status, CommandStatus::Queued);
    assert_eq!(cmd.issued_at_ms, 100);
    assert!(cmd.sent_at_ms.is_none());
    assert!(cmd.error.is_none());
}

#[test]
fn command_op_serde_shape() {
    let op = CommandOp::SendKey {
        key: NamedKey::Enter,
    };
    let json = serde_json::to_value(&op).unwrap();
    assert_eq!(json["op"], "send_key");

    let op = CommandOp::Resize { cols: 80, rows: 24 };
    let json = serde_json::to_value(&op).unwrap();
    assert_eq!(json["op"], "resize");
    assert_eq!(json["cols"], 80);
}

#[test]
fn session_status_display() {
    assert_eq!(SessionStatus::WaitingReview.to_string(), "waiting_review");
    assert_eq!(SessionStatus::HumanTakeover.to_string(), "human_takeover");
}
