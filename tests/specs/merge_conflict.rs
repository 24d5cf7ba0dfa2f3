//! Merge conflict handoff: the second worktree collides, a coder
//! session gets the resolver prompt, and the task returns to pending.

use crate::prelude::*;
use fm_core::{ProjectEventKind, TaskStatus, WorktreeStatus};
use fm_engine::{HubEvent, MergeStatus, Topic};

#[tokio::test]
async fn conflicting_worktrees_hand_off_to_a_coder() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    init_repo(repo).await;
    let h = Harness::at(repo);

    // Two worktrees branch off the same base and touch the same file
    let first = h
        .worktrees
        .create(&h.project_id(), None, "feature/one", None)
        .await
        .unwrap();
    let second = h
        .worktrees
        .create(&h.project_id(), Some(&h.task_id()), "feature/two", None)
        .await
        .unwrap();

    std::fs::write(first.path.join("shared.txt"), "first version\n").unwrap();
    git(&first.path, &["commit", "--quiet", "-am", "first edit"]).await;
    std::fs::write(second.path.join("shared.txt"), "second version\n").unwrap();
    git(&second.path, &["commit", "--quiet", "-am", "second edit"]).await;

    // First merge lands cleanly
    let outcome = h.worktrees.merge(&first.id, None).await.unwrap();
    assert_eq!(outcome.status, MergeStatus::Merged);

    // Second merge collides on the shared file
    h.store.with(|state| {
        let mut task = state.task(&h.task_id()).unwrap().clone();
        task.status = TaskStatus::Running;
        state.upsert_task(task);
    });
    let outcome = h.worktrees.merge(&second.id, None).await.unwrap();
    assert_eq!(outcome.status, MergeStatus::Conflict);
    assert_eq!(outcome.conflict_files, vec!["shared.txt"]);

    let stored = h.store.with(|s| s.worktree(&second.id).cloned()).unwrap();
    assert_eq!(stored.status, WorktreeStatus::Conflict);
    let task = h.store.with(|s| s.task(&h.task_id()).cloned()).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);

    // Hand off with no session hint: an active coder session is picked
    let coder = h
        .sessions
        .create(&h.task_id(), "claude", "coder")
        .await
        .unwrap();
    let mut sub = h.hub.subscribe(vec![Topic::Project("p1".to_string())]);

    let chosen = h
        .worktrees
        .resolve_conflict_handoff(&second.id, None, None, &h.sessions)
        .await
        .unwrap();
    assert_eq!(chosen, Some(coder.id.clone()));

    let sent = h.gateway.sent_text(&coder.mux_window_id);
    assert!(sent.contains("resolve merge conflicts"));
    assert!(sent.ends_with('\n'));

    let stored = h.store.with(|s| s.worktree(&second.id).cloned()).unwrap();
    assert_eq!(stored.status, WorktreeStatus::Active);

    let mut kinds = Vec::new();
    while let Some(event) = sub.try_recv() {
        if let HubEvent::Project(event) = event {
            kinds.push(event.kind);
        }
    }
    assert!(kinds.contains(&ProjectEventKind::WorktreeConflictResolutionRequested));
}
