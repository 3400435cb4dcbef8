//! Thread-to-async bridge for broadcast events.

use mcsm_core::{Event, EventSink};
use tokio::sync::mpsc;
use tracing::trace;

/// Receiving half, owned by the broadcaster's drain task.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Many-producer FIFO of events awaiting broadcast.
///
/// `push` never blocks and may be called from std threads as well as tasks.
/// Events pushed after the drain task has gone are dropped.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventQueue {
    /// Create the queue and the receiver for the drain task.
    pub fn new() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push(&self, event: Event) {
        if let Err(e) = self.tx.send(event) {
            trace!(kind = ?e.0.kind(), "Broadcaster gone, dropping event");
        }
    }

    /// Whether the drain task is still receiving.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl EventSink for EventQueue {
    fn report(&self, event: Event) {
        self.push(event);
    }
}
