//! SSE endpoints.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures_util::stream::Stream;

use crate::sse::{StreamMode, observer_stream};
use crate::state::AppState;

/// Every broadcast event, with heartbeats while idle.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    observer_stream(&state.observers, StreamMode::Continuous)
}

/// Like [`stream`], but closes after the first `success` or `error` event.
pub async fn progress(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    observer_stream(&state.observers, StreamMode::UntilTerminal)
}
