// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event hub: in-process pub/sub with per-subscriber backpressure.
//!
//! Publishers never block. Each subscriber owns a bounded outbox;
//! when it overflows the oldest frame is dropped and the subscriber's
//! lag counter ticks. Per-(topic, publisher) order is preserved because
//! publishing appends under the outbox lock; cross-topic order is not
//! guaranteed.

use fm_core::{ProjectEvent, ProjectId, StreamEvent, TerminalFrame};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Outbox capacity per subscriber before drop-oldest kicks in.
pub const OUTBOX_CAPACITY: usize = 256;

/// Subscription topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Terminal frames for one multiplexer window.
    Terminal(String),
    /// Project events for one project.
    Project(String),
    /// Orchestrator stream events for one project.
    Orchestrator(String),
    /// Project and orchestrator events for every project.
    AllProjects,
}

/// An event delivered through the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    Terminal(TerminalFrame),
    Project(ProjectEvent),
    Orchestrator {
        project_id: ProjectId,
        event: StreamEvent,
    },
}

impl HubEvent {
    fn topics(&self) -> Vec<Topic> {
        match self {
            HubEvent::Terminal(frame) => vec![Topic::Terminal(frame.window_id.clone())],
            HubEvent::Project(event) => vec![
                Topic::Project(event.project_id.0.clone()),
                Topic::AllProjects,
            ],
            HubEvent::Orchestrator { project_id, .. } => vec![
                Topic::Orchestrator(project_id.0.clone()),
                Topic::AllProjects,
            ],
        }
    }
}

struct Outbox {
    queue: Mutex<VecDeque<HubEvent>>,
    notify: Notify,
    lag: AtomicU64,
    closed: AtomicU64,
}

impl Outbox {
    fn push(&self, event: HubEvent) {
        {
            let mut queue = self.queue.lock();
            if queue.len() >= OUTBOX_CAPACITY {
                queue.pop_front();
                self.lag.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(event);
        }
        self.notify.notify_one();
    }
}

#[derive(Default)]
struct HubState {
    // topic -> subscriber ids
    topics: HashMap<Topic, HashSet<u64>>,
    // subscriber id -> interest set (for cleanup and re-focus)
    interests: HashMap<u64, HashSet<Topic>>,
}

/// Process-wide pub/sub hub.
#[derive(Clone, Default)]
pub struct EventHub {
    state: Arc<RwLock<HubState>>,
    outboxes: Arc<RwLock<HashMap<u64, Arc<Outbox>>>>,
    next_id: Arc<AtomicU64>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to every subscriber of its topic.
    ///
    /// Never blocks: slow subscribers lose their oldest frames.
    pub fn publish(&self, event: HubEvent) {
        let mut subscriber_ids: Vec<u64> = {
            let state = self.state.read();
            event
                .topics()
                .iter()
                .filter_map(|topic| state.topics.get(topic))
                .flat_map(|ids| ids.iter().copied())
                .collect()
        };
        subscriber_ids.sort_unstable();
        subscriber_ids.dedup();
        if subscriber_ids.is_empty() {
            return;
        }

        let outboxes = self.outboxes.read();
        for id in subscriber_ids {
            if let Some(outbox) = outboxes.get(&id) {
                outbox.push(event.clone());
            }
        }
    }

    pub fn publish_terminal(&self, frame: TerminalFrame) {
        self.publish(HubEvent::Terminal(frame));
    }

    pub fn publish_project(&self, event: ProjectEvent) {
        self.publish(HubEvent::Project(event));
    }

    pub fn publish_orchestrator(&self, project_id: ProjectId, event: StreamEvent) {
        self.publish(HubEvent::Orchestrator { project_id, event });
    }

    /// Subscribe with an initial interest set.
    pub fn subscribe(&self, topics: Vec<Topic>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let outbox = Arc::new(Outbox {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            lag: AtomicU64::new(0),
            closed: AtomicU64::new(0),
        });

        self.outboxes.write().insert(id, Arc::clone(&outbox));
        {
            let mut state = self.state.write();
            for topic in &topics {
                state.topics.entry(topic.clone()).or_default().insert(id);
            }
            state.interests.insert(id, topics.into_iter().collect());
        }

        Subscription {
            id,
            hub: self.clone(),
            outbox,
        }
    }

    /// Replace a subscriber's interest set (client re-focused).
    fn set_topics(&self, id: u64, topics: Vec<Topic>) {
        let mut state = self.state.write();
        if let Some(old) = state.interests.remove(&id) {
            for topic in old {
                if let Some(ids) = state.topics.get_mut(&topic) {
                    ids.remove(&id);
                    if ids.is_empty() {
                        state.topics.remove(&topic);
                    }
                }
            }
        }
        for topic in &topics {
            state.topics.entry(topic.clone()).or_default().insert(id);
        }
        state.interests.insert(id, topics.into_iter().collect());
    }

    fn unsubscribe(&self, id: u64) {
        self.set_topics(id, Vec::new());
        let mut state = self.state.write();
        state.interests.remove(&id);
        drop(state);
        if let Some(outbox) = self.outboxes.write().remove(&id) {
            outbox.closed.store(1, Ordering::SeqCst);
            outbox.notify.notify_one();
        }
    }

    /// Number of live subscribers (diagnostics).
    pub fn subscriber_count(&self) -> usize {
        self.outboxes.read().len()
    }
}

/// One subscriber's receive handle. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    hub: EventHub,
    outbox: Arc<Outbox>,
}

impl Subscription {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<HubEvent> {
        loop {
            if let Some(event) = self.outbox.queue.lock().pop_front() {
                return Some(event);
            }
            if self.outbox.closed.load(Ordering::SeqCst) != 0 {
                return None;
            }
            self.outbox.notify.notified().await;
        }
    }

    /// Non-blocking poll.
    pub fn try_recv(&mut self) -> Option<HubEvent> {
        self.outbox.queue.lock().pop_front()
    }

    /// Frames dropped because this subscriber fell behind.
    pub fn lag(&self) -> u64 {
        self.outbox.lag.load(Ordering::Relaxed)
    }

    /// Replace the interest set.
    pub fn set_topics(&self, topics: Vec<Topic>) {
        self.hub.set_topics(self.id, topics);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
