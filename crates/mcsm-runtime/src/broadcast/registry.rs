//! Connected observers and their outboxes.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures_util::Stream;
use mcsm_core::EventKind;
use tokio::sync::mpsc;
use tracing::debug;

/// Default outbox capacity per observer.
pub const DEFAULT_OBSERVER_BUFFER: usize = 256;

/// Identifier handed out on registration; increases monotonically.
pub type ObserverId = u64;

/// Delivery transport of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    WebSocket,
    Sse,
}

/// One serialized event, shared by every outbox it is delivered to.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: EventKind,
    pub json: Arc<str>,
}

impl Frame {
    /// `success` or `error`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::Success | EventKind::Error)
    }
}

struct ObserverEntry {
    kind: ObserverKind,
    outbox: mpsc::Sender<Frame>,
}

/// Concurrent map of observer id to outbox.
///
/// Transports register and deregister; the drain loop reads it and removes
/// observers whose delivery failed.
pub struct ObserverRegistry {
    observers: DashMap<ObserverId, ObserverEntry>,
    next_id: AtomicU64,
    buffer: usize,
}

impl ObserverRegistry {
    pub fn new(buffer: usize) -> Self {
        Self {
            observers: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Add an observer. Dropping the subscription removes it again.
    pub fn register(self: &Arc<Self>, kind: ObserverKind) -> ObserverSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (outbox, rx) = mpsc::channel(self.buffer);
        self.observers.insert(id, ObserverEntry { kind, outbox });
        debug!(id, ?kind, total = self.observers.len(), "Observer registered");
        ObserverSubscription {
            id,
            kind,
            rx,
            registry: Arc::clone(self),
        }
    }

    /// Remove an observer. Returns whether it was present.
    pub fn deregister(&self, id: ObserverId) -> bool {
        let removed = self.observers.remove(&id).is_some();
        if removed {
            debug!(id, total = self.observers.len(), "Observer removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn count(&self, kind: ObserverKind) -> usize {
        self.observers
            .iter()
            .filter(|entry| entry.value().kind == kind)
            .count()
    }

    /// Outboxes to deliver to, in registration order. `None` selects every kind.
    pub(crate) fn targets(
        &self,
        only: Option<ObserverKind>,
    ) -> Vec<(ObserverId, mpsc::Sender<Frame>)> {
        let mut targets: Vec<_> = self
            .observers
            .iter()
            .filter(|entry| only.is_none_or(|kind| entry.value().kind == kind))
            .map(|entry| (*entry.key(), entry.value().outbox.clone()))
            .collect();
        targets.sort_unstable_by_key(|(id, _)| *id);
        targets
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_BUFFER)
    }
}

/// Receiving end of one observer registration.
///
/// Also a [`Stream`] of frames, which is how the SSE transport consumes it.
pub struct ObserverSubscription {
    id: ObserverId,
    kind: ObserverKind,
    rx: mpsc::Receiver<Frame>,
    registry: Arc<ObserverRegistry>,
}

impl ObserverSubscription {
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    pub const fn kind(&self) -> ObserverKind {
        self.kind
    }

    /// Next frame; `None` once the observer was removed and the outbox drained.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

impl Stream for ObserverSubscription {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ObserverSubscription {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
