//! Server-Sent Events transport.
//!
//! Each connection registers an SSE observer and forwards its frames as
//! `data:` lines. Idle heartbeats come from the broadcaster, so no extra
//! keep-alive is configured here.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, Sse};
use futures_util::stream::{self, Stream};
use mcsm_runtime::{ObserverKind, ObserverRegistry};
use tracing::debug;

/// How long a stream stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Until the client disconnects.
    Continuous,
    /// Until the first `success` or `error` event has been sent.
    UntilTerminal,
}

/// Register an SSE observer and stream its frames.
///
/// The stream owns its subscription and does not borrow `observers`.
pub fn observer_stream(
    observers: &Arc<ObserverRegistry>,
    mode: StreamMode,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + use<>> {
    let subscription = observers.register(ObserverKind::Sse);
    debug!(id = subscription.id(), ?mode, "SSE observer connected");

    // `None` state ends the stream and drops the subscription.
    let frames = stream::unfold(Some(subscription), move |state| async move {
        let mut subscription = state?;
        let frame = subscription.recv().await?;
        let next = if mode == StreamMode::UntilTerminal && frame.is_terminal() {
            debug!(id = subscription.id(), "Terminal event sent, closing SSE stream");
            None
        } else {
            Some(subscription)
        };
        Some((Ok(Event::default().data(&*frame.json)), next))
    });

    Sse::new(frames)
}
