//! Broadcast delivery across the SSE and WebSocket transports.

mod common;

use std::net::TcpListener as StdTcpListener;
use std::time::Duration;

use common::{SseClient, spawn, spawn_with, test_settings, ws_connect, ws_next, ws_send};
use mcsm_core::Event;
use mcsm_runtime::ObserverKind;
use serde_json::{Value, json};

#[tokio::test]
async fn events_reach_every_observer_in_order() {
    let server = spawn().await;
    let mut ws_a = ws_connect(&server.ws_url()).await;
    let mut ws_b = ws_connect(&server.ws_url()).await;
    let mut sse_a = SseClient::connect(&server.url("/api/events")).await;
    let mut sse_b = SseClient::connect(&server.url("/api/events")).await;
    server.wait_for_observers(ObserverKind::WebSocket, 2).await;
    server.wait_for_observers(ObserverKind::Sse, 2).await;

    for message in ["E1", "E2", "E3"] {
        server.state().events.push(Event::log(message));
    }

    for ws in [&mut ws_a, &mut ws_b] {
        for expected in ["E1", "E2", "E3"] {
            let event = ws_next(ws).await;
            assert_eq!(event, json!({ "type": "log", "message": expected }));
        }
    }
    for sse in [&mut sse_a, &mut sse_b] {
        for expected in ["E1", "E2", "E3"] {
            let event = sse.next_message().await.unwrap();
            assert_eq!(event["message"], expected);
        }
    }
}

#[tokio::test]
async fn idle_heartbeats_go_to_sse_only() {
    let server = spawn().await;
    let mut ws = ws_connect(&server.ws_url()).await;
    let mut sse = SseClient::connect(&server.url("/api/events")).await;
    server.wait_for_observers(ObserverKind::WebSocket, 1).await;

    let heartbeat = sse.next_event().await.unwrap();
    assert_eq!(heartbeat, json!({ "type": "heartbeat", "message": "" }));

    // Several poll intervals have passed; the WebSocket must not have queued
    // any heartbeats ahead of the next real event.
    tokio::time::sleep(Duration::from_millis(500)).await;
    server.state().events.push(Event::progress("Downloading server.jar...", 40));
    let event = ws_next(&mut ws).await;
    assert_eq!(event["type"], "progress");
    assert_eq!(event["percent"], 40);
}

#[tokio::test]
async fn json_messages_are_echoed() {
    let server = spawn().await;
    let mut ws = ws_connect(&server.ws_url()).await;

    ws_send(&mut ws, "not json").await;
    ws_send(&mut ws, r#"{"hello":"world","n":1}"#).await;

    let reply = ws_next(&mut ws).await;
    assert_eq!(
        reply,
        json!({ "type": "echo", "data": { "hello": "world", "n": 1 } })
    );
}

#[tokio::test]
async fn disconnected_observers_are_removed() {
    let server = spawn().await;
    let ws = ws_connect(&server.ws_url()).await;
    let sse = SseClient::connect(&server.url("/api/events")).await;
    server.wait_for_observers(ObserverKind::WebSocket, 1).await;
    server.wait_for_observers(ObserverKind::Sse, 1).await;

    drop(ws);
    drop(sse);
    // The SSE side notices on its next write: an event or a heartbeat.
    server.state().events.push(Event::log("nobody home"));
    server.wait_for_observers(ObserverKind::WebSocket, 0).await;
    server.wait_for_observers(ObserverKind::Sse, 0).await;
}

#[tokio::test]
async fn websocket_info_reports_bound_port() {
    let server = spawn().await;
    let info: Value = reqwest::get(server.url("/api/websocket-info"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(info["host"], "127.0.0.1");
    assert_eq!(info["port"], json!(server.server.ws_port().unwrap()));
}

#[tokio::test]
async fn websocket_moves_past_a_busy_port() {
    let busy = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let taken = busy.local_addr().unwrap().port();

    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    settings.ws_port = taken;
    settings.max_port_attempts = 10;
    let server = spawn_with(dir, settings).await;

    let port = server.server.ws_port().unwrap();
    assert!(port > taken && port < taken + 10, "bound {port}, busy {taken}");

    // Still a working transport on the new port.
    let mut ws = ws_connect(&server.ws_url()).await;
    server.wait_for_observers(ObserverKind::WebSocket, 1).await;
    server.state().events.push(Event::log("moved"));
    assert_eq!(ws_next(&mut ws).await["message"], "moved");
}

#[tokio::test]
async fn api_survives_without_websocket() {
    let busy = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let taken = busy.local_addr().unwrap().port();

    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    settings.ws_port = taken;
    settings.max_port_attempts = 1;
    let server = spawn_with(dir, settings).await;
    assert_eq!(server.server.ws_port(), None);

    let info: Value = reqwest::get(server.url("/api/websocket-info"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["port"], Value::Null);

    // SSE still carries events.
    let mut sse = SseClient::connect(&server.url("/api/events")).await;
    server.state().events.push(Event::log("sse only"));
    assert_eq!(sse.next_message().await.unwrap()["message"], "sse only");
}

#[tokio::test]
async fn setup_progress_stream_ends_on_success() {
    let server = spawn().await;
    let mut progress = SseClient::connect(&server.url("/api/progress")).await;
    let server_dir = server.root().join("mc_server");

    let response: Value = reqwest::Client::new()
        .post(server.url("/api/setup"))
        .json(&json!({ "serverDir": server_dir, "acceptEula": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response, json!({ "status": "started" }));

    let mut events = Vec::new();
    while let Some(event) = progress.next_message().await {
        events.push(event);
    }

    let last = events.last().unwrap();
    assert_eq!(last["type"], "success");
    assert_eq!(last["percent"], 100);
    let percents: Vec<u64> = events
        .iter()
        .filter_map(|e| e["percent"].as_u64())
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");

    assert!(server_dir.join("server.jar").is_file());
    let eula = std::fs::read_to_string(server_dir.join("eula.txt")).unwrap();
    assert!(eula.contains("eula=true"));
}

#[tokio::test]
async fn setup_failure_ends_progress_with_error() {
    let server = spawn().await;
    let mut progress = SseClient::connect(&server.url("/api/progress")).await;

    reqwest::Client::new()
        .post(server.url("/api/setup"))
        .json(&json!({ "serverDir": server.root().join("broken"), "version": "0.0.0" }))
        .send()
        .await
        .unwrap();

    let mut last = None;
    while let Some(event) = progress.next_message().await {
        last = Some(event);
    }
    let last = last.unwrap();
    assert_eq!(last["type"], "error");
    assert!(last["message"].as_str().unwrap().contains("0.0.0"));
}
