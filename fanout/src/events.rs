//! Structured transform events and sink implementations.
//!
//! Event emission is observability only; it is not part of the correctness
//! contract of the engine.

use crate::utils::Timestamp;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, Level};

/// A structured event emitted during a transform call.
#[derive(Debug, Clone)]
pub struct TransformEvent {
    /// Event type, e.g. `transform.retry_scheduled`.
    pub event_type: String,
    /// Operation label of the transform call.
    pub label: String,
    /// Key identity, when the event concerns a single key.
    pub key: Option<String>,
    /// Attempt number, when the event concerns a single attempt.
    pub attempt: Option<u32>,
    /// Optional structured payload.
    pub data: Option<serde_json::Value>,
    /// When the event was created.
    pub at: Timestamp,
}

impl TransformEvent {
    /// Creates a call-level event.
    #[must_use]
    pub fn call(event_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            label: label.into(),
            key: None,
            attempt: None,
            data: None,
            at: Utc::now(),
        }
    }

    /// Creates a key-level event.
    #[must_use]
    pub fn keyed(
        event_type: impl Into<String>,
        label: impl Into<String>,
        key: impl Into<String>,
        attempt: u32,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            label: label.into(),
            key: Some(key.into()),
            attempt: Some(attempt),
            data: None,
            at: Utc::now(),
        }
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Trait for sinks that receive transform events.
///
/// Sinks are used for observability, logging, and analytics.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: TransformEvent);

    /// Emits an event without blocking.
    ///
    /// This method should never raise an exception; the engine calls it from
    /// inside retry loops.
    fn try_emit(&self, event: TransformEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: TransformEvent) {
        // Intentionally empty - discards all events
    }

    fn try_emit(&self, _event: TransformEvent) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &TransformEvent) {
        if self.level == Level::DEBUG {
            debug!(
                event_type = %event.event_type,
                label = %event.label,
                key = event.key.as_deref(),
                attempt = event.attempt,
                data = ?event.data,
                "Event: {}", event.event_type
            );
        } else {
            info!(
                event_type = %event.event_type,
                label = %event.label,
                key = event.key.as_deref(),
                attempt = event.attempt,
                data = ?event.data,
                "Event: {}", event.event_type
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: TransformEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: TransformEvent) {
        self.log_event(&event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<TransformEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<TransformEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<TransformEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: TransformEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: TransformEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_event_carries_key_and_attempt() {
        let event = TransformEvent::keyed("transform.retry_scheduled", "list nodes", "n1", 2)
            .with_data(serde_json::json!({ "delay_ms": 0 }));

        assert_eq!(event.event_type, "transform.retry_scheduled");
        assert_eq!(event.key.as_deref(), Some("n1"));
        assert_eq!(event.attempt, Some(2));
        assert!(event.data.is_some());
    }

    #[test]
    fn test_collecting_sink_records_and_filters() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.try_emit(TransformEvent::call("transform.completed", "op"));
        sink.try_emit(TransformEvent::keyed("transform.key_failed", "op", "k", 5));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events_of_type("transform.key_failed").len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_async_emit_records() {
        let sink = CollectingEventSink::new();
        sink.emit(TransformEvent::call("transform.completed", "op")).await;
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_noop_sink_discards() {
        // Nothing observable, just exercise the paths.
        let sink = NoOpEventSink;
        sink.try_emit(TransformEvent::call("transform.completed", "op"));
    }
}
