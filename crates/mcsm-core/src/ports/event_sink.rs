//! Event sink port: the synchronous producer side of the event pipeline.
//!
//! Producers (setup workflow, supervisor, console readers) call
//! [`EventSink::report`] from any thread. Implementations must not block.

use std::sync::{Arc, Mutex, PoisonError};

use crate::events::Event;

/// Destination for broadcast events.
///
/// # Implementations
///
/// - `NoopEventSink` - CLI contexts without observers
/// - `RecordingEventSink` - tests that assert on the emitted sequence
/// - `EventQueue` in `mcsm-runtime` - the real broadcaster bridge
pub trait EventSink: Send + Sync {
    /// Hand one event to the sink. Must not block the caller.
    fn report(&self, event: Event);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn report(&self, event: Event) {
        (**self).report(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn report(&self, _event: Event) {}
}

/// Keeps every reported event in memory, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingEventSink {
    fn report(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
