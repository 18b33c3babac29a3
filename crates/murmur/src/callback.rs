// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive and event callback plumbing.
//!
//! A subscriber holds at most one receive callback and at most one event
//! callback per event kind. Callbacks are invoked from transport and
//! registration threads, so they must be `Send + Sync`, return promptly,
//! and must not panic. Calling back into subscriber mutators from an event
//! callback deadlocks (the event-map lock is held across dispatch).

use crate::types::{DataTypeInformation, EntityId, TopicInfo};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Connection lifecycle events a subscriber can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberEventKind {
    /// A publisher became active (second registration touch).
    Connected,
    /// The last active publisher went away.
    Disconnected,
    /// An active publisher refreshed its registration.
    UpdateConnection,
    /// A send-clock gap was detected on an accepted sample.
    Dropped,
}

/// Payload handed to event callbacks.
///
/// `publisher_entity_id` and `publisher_data_type` are set for
/// [`Connected`](SubscriberEventKind::Connected) and
/// [`UpdateConnection`](SubscriberEventKind::UpdateConnection) events only;
/// `clock` carries the send clock at the gap for
/// [`Dropped`](SubscriberEventKind::Dropped) events and is zero otherwise.
#[derive(Debug, Clone, Default)]
pub struct SubscriberEvent {
    pub kind: Option<SubscriberEventKind>,
    /// Event time in microseconds.
    pub time_us: i64,
    /// Send clock at the gap (Dropped events only).
    pub clock: i64,
    pub publisher_entity_id: Option<EntityId>,
    pub publisher_data_type: Option<DataTypeInformation>,
}

/// Payload view handed to the receive callback.
///
/// The buffer borrow is valid only for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct ReceivedData<'a> {
    pub payload: &'a [u8],
    pub filter_id: i64,
    pub send_time_us: i64,
    pub send_clock: i64,
}

/// Receive callback: (publisher topic info, publisher data type, payload).
///
/// Invoked synchronously on the transport thread that delivered the
/// sample, serialized across all transport layers of one subscriber.
pub type ReceiveCallback =
    Box<dyn for<'a> Fn(TopicInfo<'a>, &DataTypeInformation, &ReceivedData<'a>) + Send + Sync>;

/// Event callback: (subscriber topic name, event payload).
pub type EventCallback = Box<dyn Fn(&str, &SubscriberEvent) + Send + Sync>;

/// Per-event-kind callback map.
///
/// Dispatch happens under the map lock, so registration never races an
/// in-flight event and events of one subscriber are serialized.
#[derive(Default)]
pub struct EventCallbacks {
    map: Mutex<HashMap<SubscriberEventKind, EventCallback>>,
}

impl EventCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `callback` for `kind`, replacing any previous one.
    pub fn register(&self, kind: SubscriberEventKind, callback: EventCallback) {
        self.map.lock().insert(kind, callback);
    }

    /// Remove the callback for `kind`. Returns whether one was installed.
    pub fn unregister(&self, kind: SubscriberEventKind) -> bool {
        self.map.lock().remove(&kind).is_some()
    }

    /// Remove all callbacks (subscriber stop).
    pub fn clear(&self) {
        self.map.lock().clear();
    }

    /// Dispatch `event` to the callback registered for its kind, if any.
    pub fn fire(&self, topic_name: &str, event: &SubscriberEvent) {
        let Some(kind) = event.kind else { return };
        let map = self.map.lock();
        if let Some(callback) = map.get(&kind) {
            callback(topic_name, event);
        }
    }
}

impl std::fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("registered", &self.map.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_callback(counter: Arc<AtomicUsize>) -> EventCallback {
        Box::new(move |_topic, _event| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn event(kind: SubscriberEventKind) -> SubscriberEvent {
        SubscriberEvent {
            kind: Some(kind),
            ..SubscriberEvent::default()
        }
    }

    #[test]
    fn test_fire_reaches_registered_kind_only() {
        let callbacks = EventCallbacks::new();
        let connected = Arc::new(AtomicUsize::new(0));
        callbacks.register(SubscriberEventKind::Connected, counting_callback(connected.clone()));

        callbacks.fire("topic", &event(SubscriberEventKind::Connected));
        callbacks.fire("topic", &event(SubscriberEventKind::Dropped));

        assert_eq!(connected.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_replaces_previous_callback() {
        let callbacks = EventCallbacks::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        callbacks.register(SubscriberEventKind::Dropped, counting_callback(first.clone()));
        callbacks.register(SubscriberEventKind::Dropped, counting_callback(second.clone()));
        callbacks.fire("topic", &event(SubscriberEventKind::Dropped));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister() {
        let callbacks = EventCallbacks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        callbacks.register(SubscriberEventKind::Connected, counting_callback(counter.clone()));

        assert!(callbacks.unregister(SubscriberEventKind::Connected));
        assert!(!callbacks.unregister(SubscriberEventKind::Connected));

        callbacks.fire("topic", &event(SubscriberEventKind::Connected));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_removes_all() {
        let callbacks = EventCallbacks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        callbacks.register(SubscriberEventKind::Connected, counting_callback(counter.clone()));
        callbacks.register(SubscriberEventKind::Dropped, counting_callback(counter.clone()));

        callbacks.clear();
        callbacks.fire("topic", &event(SubscriberEventKind::Connected));
        callbacks.fire("topic", &event(SubscriberEventKind::Dropped));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_payload_reaches_callback() {
        let callbacks = EventCallbacks::new();
        let seen_clock = Arc::new(AtomicUsize::new(0));
        let seen = seen_clock.clone();
        callbacks.register(
            SubscriberEventKind::Dropped,
            Box::new(move |topic, event| {
                assert_eq!(topic, "telemetry");
                seen.store(event.clock as usize, Ordering::SeqCst);
            }),
        );

        let mut dropped = event(SubscriberEventKind::Dropped);
        dropped.clock = 17;
        callbacks.fire("telemetry", &dropped);
        assert_eq!(seen_clock.load(Ordering::SeqCst), 17);
    }
}
