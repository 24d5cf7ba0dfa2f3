//! Close gate: coder sessions survive until the review loop passes.

use crate::prelude::*;
use fm_core::{CycleStatus, IssueSeverity, IssueStatus, SessionStatus};

#[tokio::test]
async fn coder_session_close_is_gated_on_review() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::at(dir.path());

    let session = h
        .sessions
        .create(&h.task_id(), "claude", "coder")
        .await
        .unwrap();

    // No passing cycle yet: the gate refuses
    let gate = h.sessions.close_check(&session.id).unwrap();
    assert!(!gate.can_close);
    assert!(!gate.reason.is_empty());

    let err = h.sessions.destroy(&session.id).await.unwrap_err();
    assert_eq!(err.kind(), fm_core::ErrorKind::Conflict);
    assert_eq!(h.gateway.session_names().len(), 1);

    // A cycle with an open issue keeps the gate shut
    let cycle = h.review.create_cycle(&h.task_id(), "abc").unwrap();
    let issue = h
        .review
        .create_issue(&cycle.id, IssueSeverity::High, "logic bug")
        .unwrap();
    assert!(!h.sessions.close_check(&session.id).unwrap().can_close);

    // Resolve the issue: the cycle passes and the gate opens
    h.review
        .update_issue(&issue.id, Some(IssueStatus::Resolved), None)
        .unwrap();
    let gate = h.sessions.close_check(&session.id).unwrap();
    assert!(gate.can_close, "gate: {:?}", gate);
    assert_eq!(gate.review_verdict, Some(CycleStatus::ReviewPassed));

    // Deletion now succeeds and tears the multiplexer session down
    h.sessions.destroy(&session.id).await.unwrap();
    assert!(h.gateway.session_names().is_empty());
    let stored = h.store.with(|s| s.session(&session.id).cloned()).unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
}
