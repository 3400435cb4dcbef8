//! Drain loop fanning queued events out to every observer.
//!
//! A single task owns the queue receiver. Each event is serialized once and
//! handed to the observers one after another through their bounded outboxes.
//! A send that fails or exceeds the send timeout removes only that observer.
//! When the queue stays empty for a poll interval, SSE observers get a
//! heartbeat.

use std::sync::Arc;
use std::time::Duration;

use mcsm_core::{Event, Settings};
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::queue::EventReceiver;
use super::registry::{Frame, ObserverKind, ObserverRegistry};

/// Tunables of the drain loop.
#[derive(Debug, Clone, Copy)]
pub struct BroadcasterConfig {
    /// Idle time before a heartbeat.
    pub poll_interval: Duration,
    /// Per-observer delivery bound.
    pub send_timeout: Duration,
}

impl BroadcasterConfig {
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            send_timeout: settings.send_timeout(),
        }
    }
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            send_timeout: Duration::from_millis(250),
        }
    }
}

/// Owner of the delivery loop.
pub struct Broadcaster {
    registry: Arc<ObserverRegistry>,
    config: BroadcasterConfig,
}

impl Broadcaster {
    pub const fn new(registry: Arc<ObserverRegistry>, config: BroadcasterConfig) -> Self {
        Self { registry, config }
    }

    /// Run the drain loop on its own task.
    pub fn spawn(self, rx: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    /// Drain until every queue handle is dropped.
    pub async fn run(self, mut rx: EventReceiver) {
        debug!("Broadcaster started");
        loop {
            match timeout(self.config.poll_interval, rx.recv()).await {
                Ok(Some(event)) => {
                    self.deliver(&event, None).await;
                }
                Ok(None) => break,
                Err(_) => {
                    self.deliver(&Event::heartbeat(), Some(ObserverKind::Sse))
                        .await;
                }
            }
        }
        debug!("Broadcaster stopped, queue closed");
    }

    /// Deliver one event. Returns the number of observers that accepted it.
    async fn deliver(&self, event: &Event, only: Option<ObserverKind>) -> usize {
        let targets = self.registry.targets(only);
        if targets.is_empty() {
            return 0;
        }

        let json = match event.to_json() {
            Ok(json) => Arc::<str>::from(json),
            Err(e) => {
                warn!(error = %e, "Failed to serialize event");
                return 0;
            }
        };
        let frame = Frame {
            kind: event.kind(),
            json,
        };

        let mut delivered = 0;
        for (id, outbox) in targets {
            match outbox.send_timeout(frame.clone(), self.config.send_timeout).await {
                Ok(()) => delivered += 1,
                Err(SendTimeoutError::Timeout(_)) => {
                    warn!(id, "Observer too slow, removing");
                    self.registry.deregister(id);
                }
                Err(SendTimeoutError::Closed(_)) => {
                    debug!(id, "Observer disconnected, removing");
                    self.registry.deregister(id);
                }
            }
        }
        delivered
    }
}
