// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn first_capture_emits_everything() {
    let mut ring = OutputRing::new();
    let new = ring.record_capture(lines(&["a", "b"]), 100);
    assert_eq!(new.len(), 2);
    assert_eq!(new[0].text, "a");
    assert_eq!(new[0].timestamp_us, 100);
    assert_eq!(new[1].timestamp_us, 101);
}

#[test]
fn identical_recapture_emits_nothing() {
    let mut ring = OutputRing::new();
    ring.record_capture(lines(&["a", "b"]), 100);
    let new = ring.record_capture(lines(&["a", "b"]), 200);
    assert!(new.is_empty());
    assert_eq!(ring.len(), 2);
}

#[test]
fn scrolled_pane_emits_only_the_tail() {
    let mut ring = OutputRing::new();
    ring.record_capture(lines(&["a", "b", "c"]), 100);
    let new = ring.record_capture(lines(&["b", "c", "d"]), 200);
    assert_eq!(new.len(), 1);
    assert_eq!(new[0].text, "d");
}

#[test]
fn appended_line_emits_one_frame() {
    let mut ring = OutputRing::new();
    ring.record_capture(lines(&["a", "b"]), 100);
    let new = ring.record_capture(lines(&["a", "b", "c"]), 200);
    assert_eq!(new.len(), 1);
    assert_eq!(new[0].text, "c");
}

#[test]
fn whitespace_only_lines_are_stripped() {
    let mut ring = OutputRing::new();
    let new = ring.record_capture(lines(&["a", "   ", "", "\t", "b"]), 100);
    assert_eq!(new.len(), 2);
    assert_eq!(new[1].text, "b");
}

#[test]
fn since_filter_is_strictly_greater() {
    let mut ring = OutputRing::new();
    ring.record_capture(lines(&["a", "b"]), 100);
    let all = ring.frames_since(0);
    assert_eq!(all.len(), 2);

    let last_ts = all.last().unwrap().timestamp_us;
    assert!(ring.frames_since(last_ts).is_empty());
    assert_eq!(ring.frames_since(last_ts - 1).len(), 1);
}

#[test]
fn timestamps_stay_monotonic_when_clock_stalls() {
    let mut ring = OutputRing::new();
    ring.record_capture(lines(&["a"]), 100);
    // Clock did not advance; base must still move past the stored frame
    let new = ring.record_capture(lines(&["a", "b"]), 100);
    assert_eq!(new.len(), 1);
    assert!(new[0].timestamp_us > 100);
}

#[test]
fn ring_trims_to_capacity() {
    let mut ring = OutputRing::new();
    let mut ts = 1;
    for chunk in 0..6 {
        let batch: Vec<String> = (0..1000)
            .map(|i| format!("chunk{}-line{}", chunk, i))
            .collect();
        ring.record_capture(batch, ts);
        ts += 1_000_000;
    }
    assert_eq!(ring.len(), RING_CAPACITY);
    // Oldest frames were dropped
    let frames = ring.frames_since(0);
    assert!(frames.first().unwrap().text.starts_with("chunk1-"));
}

#[test]
fn tail_returns_newest_oldest_first() {
    let mut ring = OutputRing::new();
    ring.record_capture(lines(&["a", "b", "c"]), 100);
    let tail = ring.tail(2);
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].text, "b");
    assert_eq!(tail[1].text, "c");
}

#[test]
fn full_pane_replacement_reemits() {
    let mut ring = OutputRing::new();
    ring.record_capture(lines(&["a", "b"]), 100);
    let new = ring.record_capture(lines(&["x", "y"]), 200);
    assert_eq!(new.len(), 2);
    assert_eq!(ring.len(), 4);
}

proptest! {
    /// Re-capturing any stable pane twice never emits twice.
    #[test]
    fn recapture_is_idempotent(pane in proptest::collection::vec("[a-z0-9 ]{0,20}", 0..30)) {
        let mut ring = OutputRing::new();
        ring.record_capture(pane.clone(), 1_000);
        let second = ring.record_capture(pane, 2_000);
        prop_assert!(second.is_empty());
    }

    /// Frame timestamps are strictly increasing across captures.
    #[test]
    fn timestamps_strictly_increase(
        first in proptest::collection::vec("[a-z]{1,8}", 1..20),
        second in proptest::collection::vec("[a-z]{1,8}", 1..20),
    ) {
        let mut ring = OutputRing::new();
        ring.record_capture(first, 10);
        ring.record_capture(second, 20);
        let frames = ring.frames_since(0);
        for pair in frames.windows(2) {
            prop_assert!(pair[0].timestamp_us < pair[1].timestamp_us);
        }
    }
}
