//! Structured observability events
//!
//! Every context mutation, tool invocation, guardrail verdict, and state
//! transition emits an [`Event`] for consumption by an external visualizer or
//! tracer. Sinks are pluggable: [`TracingSink`] forwards to the `tracing`
//! subscriber, [`MemorySink`] buffers events for inspection, [`NullSink`]
//! discards them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// The kind of runtime occurrence an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TurnStarted,
    TurnCompleted,
    TurnFailed,
    ContextMutated,
    ToolInvoked,
    GuardrailEvaluated,
    Handoff,
}

/// A single structured observability event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub kind: EventKind,
    pub payload: Value,
}

impl Event {
    pub fn new(session_id: impl Into<String>, kind: EventKind, payload: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id.into(),
            kind,
            payload,
        }
    }
}

/// Destination for runtime events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Sink that forwards events to the `tracing` subscriber as structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event.kind {
            EventKind::TurnFailed => {
                warn!(session = %event.session_id, kind = ?event.kind, payload = %event.payload, "session event");
            }
            EventKind::TurnStarted | EventKind::TurnCompleted | EventKind::Handoff => {
                info!(session = %event.session_id, kind = ?event.kind, payload = %event.payload, "session event");
            }
            _ => {
                debug!(session = %event.session_id, kind = ?event.kind, payload = %event.payload, "session event");
            }
        }
    }
}

/// Sink that buffers events in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all events emitted so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event buffer poisoned").clone()
    }

    /// Returns the kinds of all events emitted so far, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events()
            .into_iter()
            .map(|event| event.kind)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        self.events.lock().expect("event buffer poisoned").push(event);
    }
}

/// Sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_buffers_in_order() {
        let sink = MemorySink::new();
        sink.emit(Event::new("s1", EventKind::TurnStarted, json!({})));
        sink.emit(Event::new("s1", EventKind::ToolInvoked, json!({"tool": "x"})));
        sink.emit(Event::new("s1", EventKind::TurnCompleted, json!({})));

        assert_eq!(
            sink.kinds(),
            vec![
                EventKind::TurnStarted,
                EventKind::ToolInvoked,
                EventKind::TurnCompleted
            ]
        );
        assert_eq!(sink.events()[1].payload["tool"], "x");
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new("abc", EventKind::ContextMutated, json!({"field": "status"}));
        let serialized = serde_json::to_string(&event).unwrap();
        assert!(serialized.contains("\"kind\":\"context_mutated\""));
        assert!(serialized.contains("\"session_id\":\"abc\""));
    }

    #[test]
    fn test_null_sink_discards() {
        let sink = NullSink;
        sink.emit(Event::new("s", EventKind::Handoff, json!({})));
    }
}
