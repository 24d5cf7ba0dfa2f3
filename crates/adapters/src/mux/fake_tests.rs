// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

#[tokio::test]
async fn records_session_lifecycle() {
    let gateway = FakeGateway::new();
    let window = gateway
        .create_session("demo-t1-coder", Path::new("/srv/repo"), "claude", &[])
        .await
        .unwrap();
    assert_eq!(window, "demo-t1-coder:0");
    assert!(gateway.has_session("demo-t1-coder").await.unwrap());

    gateway.send_raw(&window, "hello").await.unwrap();
    gateway.send_key(&window, "Enter").await.unwrap();
    assert_eq!(gateway.sent_text(&window), "hello");

    gateway.destroy_session("demo-t1-coder").await.unwrap();
    assert!(!gateway.has_session("demo-t1-coder").await.unwrap());
    assert!(gateway.send_raw(&window, "x").await.is_err());
}

#[tokio::test]
async fn scripted_pane_content() {
    let gateway = FakeGateway::new();
    gateway
        .create_session("s", Path::new("/tmp"), "cat", &[])
        .await
        .unwrap();
    gateway.set_pane("s:0", &["a", "b", "c"]);

    let lines = gateway.capture_pane("s:0", 2).await.unwrap();
    assert_eq!(lines, vec!["b", "c"]);

    let lines = gateway.capture_pane("s:0", 100).await.unwrap();
    assert_eq!(lines, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn scripted_create_failure() {
    let gateway = FakeGateway::new();
    gateway.fail_create(true);
    let err = gateway
        .create_session("s", Path::new("/tmp"), "cat", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MuxError::SpawnFailed(_)));
    assert!(!gateway.has_session("s").await.unwrap());
}

#[tokio::test]
async fn new_window_numbers_upward() {
    let gateway = FakeGateway::new();
    gateway
        .create_session("s", Path::new("/tmp"), "cat", &[])
        .await
        .unwrap();
    let second = gateway
        .new_window("s", "w2", Path::new("/tmp"), "cat")
        .await
        .unwrap();
    assert_eq!(second, "s:1");
    assert_eq!(gateway.list_windows("s").await.unwrap().len(), 2);
}
