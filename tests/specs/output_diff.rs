//! Output diff idempotence: recapturing a stable pane yields nothing.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn stable_pane_recapture_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::at(dir.path());
    let session = h
        .sessions
        .create(&h.task_id(), "claude", "coder")
        .await
        .unwrap();
    let window = session.mux_window_id.clone();

    // First capture: two frames
    h.gateway.set_pane(&window, &["a", "b"]);
    let first = h.sessions.get_output(&session.id, 100, 0).await.unwrap();
    let texts: Vec<&str> = first.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "b"]);

    // Same pane again: nothing new past the last timestamp
    let last_ts = first.last().unwrap().timestamp_us;
    let second = h
        .sessions
        .get_output(&session.id, 100, last_ts)
        .await
        .unwrap();
    assert_eq!(second.len(), 0);

    // One appended line: exactly one new frame
    h.gateway.set_pane(&window, &["a", "b", "c"]);
    let third = h
        .sessions
        .get_output(&session.id, 100, last_ts)
        .await
        .unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].text, "c");
    assert!(third[0].timestamp_us > last_ts);
}

#[tokio::test]
async fn lines_bound_returns_only_the_newest() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::at(dir.path());
    let session = h
        .sessions
        .create(&h.task_id(), "claude", "coder")
        .await
        .unwrap();

    h.gateway
        .set_pane(&session.mux_window_id, &["one", "two", "three"]);
    let frames = h.sessions.get_output(&session.id, 1, 0).await.unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].text, "three");

    // Zero lines is rejected outright
    let err = h.sessions.get_output(&session.id, 0, 0).await.unwrap_err();
    assert_eq!(err.kind(), fm_core::ErrorKind::InvalidArgument);
}
