//! In-process pub/sub keyed by trace id, built on `tokio::sync::broadcast`.
//!
//! Two channels are kept per trace: one for streaming agent "thoughts", one
//! for swarm lifecycle milestones. A slow subscriber falls behind and starts
//! missing the oldest events (broadcast's native lagged-receiver behavior)
//! rather than blocking the publisher.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use uuid::Uuid;

use super::types::{SwarmEvent, ThoughtEvent};

/// Sized so a trace can sustain at least 100 concurrent subscribers without
/// the buffer recycling faster than a normal reader drains it.
const CHANNEL_CAPACITY: usize = 256;

struct TraceChannels {
    thoughts: broadcast::Sender<ThoughtEvent>,
    events: broadcast::Sender<SwarmEvent>,
}

impl TraceChannels {
    fn new() -> Self {
        let (thoughts, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { thoughts, events }
    }
}

/// Process-wide event bus. Constructed once and shared as an `Arc`.
#[derive(Default)]
pub struct EventBus {
    traces: Mutex<HashMap<Uuid, TraceChannels>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels_for<'a>(
        guard: &'a mut HashMap<Uuid, TraceChannels>,
        trace_id: Uuid,
    ) -> &'a TraceChannels {
        guard.entry(trace_id).or_insert_with(TraceChannels::new)
    }

    /// Publish a thought event. Best-effort: no receivers is not an error.
    pub fn publish_thought(&self, event: ThoughtEvent) {
        let trace_id = event.trace_id();
        let mut guard = self.traces.lock().expect("event bus mutex poisoned");
        let channels = Self::channels_for(&mut guard, trace_id);
        let _ = channels.thoughts.send(event);
    }

    /// Publish a swarm lifecycle event. Best-effort: no receivers is not an error.
    pub fn publish_event(&self, event: SwarmEvent) {
        let trace_id = event.trace_id();
        let mut guard = self.traces.lock().expect("event bus mutex poisoned");
        let channels = Self::channels_for(&mut guard, trace_id);
        let _ = channels.events.send(event);
    }

    pub fn subscribe_thoughts(&self, trace_id: Uuid) -> broadcast::Receiver<ThoughtEvent> {
        let mut guard = self.traces.lock().expect("event bus mutex poisoned");
        Self::channels_for(&mut guard, trace_id).thoughts.subscribe()
    }

    pub fn subscribe_events(&self, trace_id: Uuid) -> broadcast::Receiver<SwarmEvent> {
        let mut guard = self.traces.lock().expect("event bus mutex poisoned");
        Self::channels_for(&mut guard, trace_id).events.subscribe()
    }

    pub fn subscriber_count(&self, trace_id: Uuid) -> usize {
        let guard = self.traces.lock().expect("event bus mutex poisoned");
        guard
            .get(&trace_id)
            .map(|c| c.thoughts.receiver_count() + c.events.receiver_count())
            .unwrap_or(0)
    }

    /// Drop the channels for a trace once it is long-terminal and evicted
    /// from `SwarmStatus`. Any existing subscribers keep their receiver; new
    /// subscriptions simply start a fresh, empty pair of channels.
    pub fn forget(&self, trace_id: Uuid) {
        self.traces.lock().expect("event bus mutex poisoned").remove(&trace_id);
    }
}
