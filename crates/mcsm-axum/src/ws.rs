//! WebSocket transport.
//!
//! Each connection registers a WebSocket observer. Two tasks share the split
//! socket:
//!
//! * **Egress** forwards broadcast frames (and echo replies) as text frames.
//!   A send that exceeds the send timeout closes the connection.
//! * **Ingest** reads client frames. Valid JSON is answered with
//!   `{"type":"echo","data":<message>}`; anything else is logged and ignored.
//!
//! Whichever task ends first aborts the other; dropping the subscription
//! removes the observer from the registry.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use mcsm_runtime::ObserverKind;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Pending echo replies per connection.
const REPLY_BUFFER: usize = 16;

/// `GET /` and `GET /ws` on the WebSocket port.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = state.observers.register(ObserverKind::WebSocket);
    let id = subscription.id();
    let send_timeout = state.settings.send_timeout();
    info!(id, total = state.observers.len(), "WebSocket observer connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_BUFFER);

    let mut egress = tokio::spawn(async move {
        loop {
            let text = tokio::select! {
                frame = subscription.recv() => match frame {
                    Some(frame) => frame.json.to_string(),
                    // Removed by the broadcaster.
                    None => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(reply) => reply,
                    None => break,
                },
            };
            match timeout(send_timeout, ws_sender.send(Message::Text(text.into()))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(id, error = %e, "WebSocket send failed");
                    break;
                }
                Err(_) => {
                    warn!(id, "WebSocket send timed out, dropping observer");
                    break;
                }
            }
        }
        // `subscription` drops here and deregisters the observer.
    });

    let mut ingest = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<Value>(text.as_str()) {
                    Ok(data) => {
                        let reply = json!({ "type": "echo", "data": data }).to_string();
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(id, error = %e, "Ignoring non-JSON WebSocket message"),
                },
                // Graceful close or protocol error
                Ok(Message::Close(_)) | Err(_) => break,
                // Ping/pong and binary frames
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut ingest => egress.abort(),
        _ = &mut egress => ingest.abort(),
    }

    info!(id, "WebSocket observer disconnected");
}
