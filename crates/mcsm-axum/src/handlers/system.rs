//! Health, WebSocket discovery and Java probe.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::HOST;
use mcsm_runtime::{JavaCheck, check_java};
use serde::Serialize;
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Where browsers should open the WebSocket.
#[derive(Debug, Serialize)]
pub struct WebSocketInfo {
    pub host: String,
    /// `None` when the transport could not bind.
    pub port: Option<u16>,
}

pub async fn websocket_info(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<WebSocketInfo> {
    let request_host = headers.get(HOST).and_then(|v| v.to_str().ok());
    Json(WebSocketInfo {
        host: advertised_host(&state.settings.host, request_host),
        port: state.ws_port(),
    })
}

pub async fn java_check(State(state): State<AppState>) -> Json<JavaCheck> {
    Json(check_java(&state.settings.java_path).await)
}

/// A wildcard bind address is useless to a client; answer with the host the
/// client used to reach us instead.
fn advertised_host(bind_host: &str, request_host: Option<&str>) -> String {
    if !matches!(bind_host, "0.0.0.0" | "::" | "[::]") {
        return bind_host.to_string();
    }
    request_host
        .map(strip_port)
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost")
        .to_string()
}

fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        return authority
            .find(']')
            .map_or(authority, |end| &authority[..=end]);
    }
    authority
        .rsplit_once(':')
        .map_or(authority, |(host, _port)| host)
}
