//! Event queue and broadcaster.
//!
//! Producers push [`Event`](mcsm_core::Event)s into an [`EventQueue`] from any
//! thread. One [`Broadcaster`] task drains it and fans each event out to the
//! observers in the [`ObserverRegistry`]. The WebSocket and SSE transports
//! register observers and forward their frames.

mod broadcaster;
mod queue;
mod registry;

pub use broadcaster::{Broadcaster, BroadcasterConfig};
pub use queue::{EventQueue, EventReceiver};
pub use registry::{
    DEFAULT_OBSERVER_BUFFER, Frame, ObserverId, ObserverKind, ObserverRegistry,
    ObserverSubscription,
};
