// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn splits_plain_words() {
    assert_eq!(split_words("ls -la /tmp"), vec!["ls", "-la", "/tmp"]);
}

#[test]
fn keeps_quoted_payload_whole() {
    assert_eq!(
        split_words("sh -c 'rm -rf /'"),
        vec!["sh", "-c", "rm -rf /"]
    );
    assert_eq!(split_words("echo \"a b\""), vec!["echo", "a b"]);
}

#[test]
fn backslash_escapes_next_char() {
    assert_eq!(split_words("echo a\\ b"), vec!["echo", "a b"]);
}

#[test]
fn splits_commands_on_separators() {
    let cmds = split_commands("cd /tmp && ls; echo done | wc -l");
    assert_eq!(cmds.len(), 4);
    assert_eq!(cmds[0], vec!["cd", "/tmp"]);
    assert_eq!(cmds[1], vec!["ls"]);
    assert_eq!(cmds[2], vec!["echo", "done"]);
    assert_eq!(cmds[3], vec!["wc", "-l"]);
}

#[test]
fn separators_inside_quotes_are_literal() {
    let cmds = split_commands("echo 'a && b'");
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0], vec!["echo", "a && b"]);
}

#[test]
fn empty_segments_dropped() {
    let cmds = split_commands("ls;;\n\n");
    assert_eq!(cmds.len(), 1);
}

#[test]
fn trailing_background_ampersand() {
    let cmds = split_commands("sleep 5 &");
    assert_eq!(cmds, vec![vec!["sleep", "5"]]);
}

proptest! {
    /// Splitting never panics and never produces empty command lists.
    #[test]
    fn splitting_is_total(text in ".{0,200}") {
        for words in split_commands(&text) {
            prop_assert!(!words.is_empty());
        }
        let _ = split_words(&text);
    }
}
