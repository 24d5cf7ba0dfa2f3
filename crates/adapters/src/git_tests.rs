// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

/// Initialize a repo with one commit on `main` and return its path.
async fn init_repo(dir: &Path) -> PathBuf {
    let repo = dir.to_path_buf();
    run(&repo, &["init", "--quiet", "-b", "main"]).await;
    run(&repo, &["config", "user.email", "test@example.com"]).await;
    run(&repo, &["config", "user.name", "Test"]).await;
    std::fs::write(repo.join("README.md"), "hello\n").unwrap();
    run(&repo, &["add", "."]).await;
    run(&repo, &["commit", "--quiet", "-m", "init"]).await;
    repo
}

async fn run(repo: &Path, args: &[&str]) {
    let output = tokio::process::Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .await
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[tokio::test]
async fn rev_parse_and_head() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path()).await;
    let git = GitPorcelain::new();

    let head = git.rev_parse(&repo, "HEAD").await.unwrap();
    assert_eq!(head.len(), 40);
    assert_eq!(git.current_head(&repo).await.unwrap(), "main");
    assert_eq!(git.default_branch(&repo).await.unwrap(), "main");
}

#[tokio::test]
async fn worktree_add_creates_checkout_on_branch() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path()).await;
    let git = GitPorcelain::new();

    let wt = repo.join(".worktrees/feature");
    std::fs::create_dir_all(wt.parent().unwrap()).unwrap();
    git.worktree_add(&repo, &wt, "feature/x").await.unwrap();
    assert!(wt.join("README.md").exists());

    git.worktree_remove(&repo, &wt).await.unwrap();
    assert!(!wt.exists());
}

#[tokio::test]
async fn clean_merge_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path()).await;
    let git = GitPorcelain::new();

    let wt = repo.join(".worktrees/add-file");
    git.worktree_add(&repo, &wt, "add-file").await.unwrap();
    std::fs::write(wt.join("new.txt"), "new\n").unwrap();
    run(&wt, &["add", "."]).await;
    run(&wt, &["commit", "--quiet", "-m", "add file"]).await;

    assert!(git.merge_no_ff(&repo, "add-file").await.unwrap());
    assert!(repo.join("new.txt").exists());
    assert!(git.is_ancestor(&repo, "add-file", "main").await.unwrap());
}

#[tokio::test]
async fn conflicting_merge_reports_files_and_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path()).await;
    let git = GitPorcelain::new();

    let wt = repo.join(".worktrees/edit");
    git.worktree_add(&repo, &wt, "edit").await.unwrap();
    std::fs::write(wt.join("README.md"), "worktree version\n").unwrap();
    run(&wt, &["commit", "--quiet", "-am", "worktree edit"]).await;

    std::fs::write(repo.join("README.md"), "main version\n").unwrap();
    run(&repo, &["commit", "--quiet", "-am", "main edit"]).await;

    assert!(!git.merge_no_ff(&repo, "edit").await.unwrap());
    let files = git.unmerged_files(&repo).await.unwrap();
    assert_eq!(files, vec!["README.md"]);

    git.merge_abort(&repo).await.unwrap();
    let content = std::fs::read_to_string(repo.join("README.md")).unwrap();
    assert_eq!(content, "main version\n");
}

#[tokio::test]
async fn is_ancestor_false_for_diverged() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path()).await;
    let git = GitPorcelain::new();

    let wt = repo.join(".worktrees/div");
    git.worktree_add(&repo, &wt, "div").await.unwrap();
    std::fs::write(wt.join("a.txt"), "a\n").unwrap();
    run(&wt, &["add", "."]).await;
    run(&wt, &["commit", "--quiet", "-m", "divergent"]).await;

    assert!(!git.is_ancestor(&repo, "div", "main").await.unwrap());
    assert!(git.is_ancestor(&repo, "main", "div").await.unwrap());
}
