// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fm_core::ProjectEventKind;
use serde_json::json;

fn frame(window: &str, text: &str, ts: u64) -> TerminalFrame {
    TerminalFrame {
        window_id: window.to_string(),
        text: text.to_string(),
        timestamp_us: ts,
    }
}

#[tokio::test]
async fn delivers_to_matching_topic_only() {
    let hub = EventHub::new();
    let mut sub = hub.subscribe(vec![Topic::Terminal("w1".to_string())]);

    hub.publish_terminal(frame("w1", "hello", 1));
    hub.publish_terminal(frame("w2", "other", 2));

    let event = sub.recv().await.unwrap();
    assert_eq!(event, HubEvent::Terminal(frame("w1", "hello", 1)));
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn preserves_publisher_order_per_topic() {
    let hub = EventHub::new();
    let mut sub = hub.subscribe(vec![Topic::Project("p1".to_string())]);

    for i in 0..10 {
        hub.publish_project(ProjectEvent::new(
            ProjectId::new("p1"),
            ProjectEventKind::StageState,
            json!({"seq": i}),
        ));
    }

    for i in 0..10 {
        match sub.recv().await.unwrap() {
            HubEvent::Project(event) => assert_eq!(event.payload["seq"], i),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

#[tokio::test]
async fn slow_subscriber_drops_oldest_and_counts_lag() {
    let hub = EventHub::new();
    let mut sub = hub.subscribe(vec![Topic::Terminal("w1".to_string())]);

    let total = OUTBOX_CAPACITY + 10;
    for i in 0..total {
        hub.publish_terminal(frame("w1", &format!("line-{}", i), i as u64));
    }

    assert_eq!(sub.lag(), 10);

    // The first delivered event is the oldest retained one
    match sub.recv().await.unwrap() {
        HubEvent::Terminal(f) => assert_eq!(f.text, "line-10"),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn publish_without_subscribers_is_a_no_op() {
    let hub = EventHub::new();
    hub.publish_terminal(frame("w1", "nobody listening", 1));
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test]
async fn drop_unsubscribes() {
    let hub = EventHub::new();
    let sub = hub.subscribe(vec![Topic::Project("p1".to_string())]);
    assert_eq!(hub.subscriber_count(), 1);
    drop(sub);
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test]
async fn refocus_changes_delivery() {
    let hub = EventHub::new();
    let mut sub = hub.subscribe(vec![Topic::Terminal("w1".to_string())]);

    sub.set_topics(vec![Topic::Terminal("w2".to_string())]);
    hub.publish_terminal(frame("w1", "old focus", 1));
    hub.publish_terminal(frame("w2", "new focus", 2));

    match sub.recv().await.unwrap() {
        HubEvent::Terminal(f) => assert_eq!(f.text, "new focus"),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn orchestrator_events_route_by_project() {
    let hub = EventHub::new();
    let mut sub = hub.subscribe(vec![Topic::Orchestrator("p1".to_string())]);

    hub.publish_orchestrator(ProjectId::new("p2"), StreamEvent::Done);
    hub.publish_orchestrator(
        ProjectId::new("p1"),
        StreamEvent::Token {
            text: "hi".to_string(),
        },
    );

    match sub.recv().await.unwrap() {
        HubEvent::Orchestrator { project_id, event } => {
            assert_eq!(project_id, ProjectId::new("p1"));
            assert_eq!(
                event,
                StreamEvent::Token {
                    text: "hi".to_string()
                }
            );
        }
        other => panic!("unexpected event: {:?}", other),
    }
}
