//! HTTP API routes against a live server.

mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use common::spawn;

async fn post_json(url: &str, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let server = spawn().await;
    let body: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn servers_are_registered_persisted_and_removed() {
    let server = spawn().await;
    let dir = server.root().join("survival1");
    let body = json!({ "name": "survival1", "directory": dir, "max_memory": "4G" });

    let first = post_json(&server.url("/api/servers"), &body).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["name"], "survival1");
    assert_eq!(first["min_memory"], "1G");
    assert_eq!(first["max_memory"], "4G");

    // A taken name gets a suffix instead of replacing the first entry.
    let second: Value = post_json(&server.url("/api/servers"), &body)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(second["name"], "survival1_2");

    let listed: Vec<Value> = reqwest::get(server.url("/api/servers"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = listed.iter().filter_map(|s| s["name"].as_str()).collect();
    assert_eq!(names, vec!["survival1", "survival1_2"]);
    assert_eq!(listed[0]["status"]["state"], "stopped");

    let saved = mcsm_core::load_definitions(&server.state().settings.servers_file).unwrap();
    assert_eq!(saved.len(), 2);

    let removed = reqwest::Client::new()
        .delete(server.url("/api/servers/survival1_2"))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::OK);
    let saved = mcsm_core::load_definitions(&server.state().settings.servers_file).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "survival1");
}

#[tokio::test]
async fn idle_server_definition_is_edited_in_place() {
    let server = spawn().await;
    let dir = server.root().join("lobby");
    post_json(
        &server.url("/api/servers"),
        &json!({ "name": "lobby", "directory": dir }),
    )
    .await;

    let client = reqwest::Client::new();
    let edited = client
        .put(server.url("/api/servers/lobby"))
        .json(&json!({ "directory": dir, "max_memory": "6G" }))
        .send()
        .await
        .unwrap();
    assert_eq!(edited.status(), StatusCode::OK);
    let edited: Value = edited.json().await.unwrap();
    assert_eq!(edited["name"], "lobby");
    assert_eq!(edited["max_memory"], "6G");

    let saved = mcsm_core::load_definitions(&server.state().settings.servers_file).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].max_memory, "6G");

    let missing = client
        .put(server.url("/api/servers/ghost"))
        .json(&json!({ "directory": dir }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn versions_come_from_the_artifact_source() {
    let server = spawn().await;
    let listing: Value = reqwest::get(server.url("/api/versions"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["latest_release"], "1.21.1");
    assert_eq!(listing["latest_snapshot"], "24w40a");
    assert_eq!(
        listing["releases"],
        json!([
            { "id": "1.21.1", "type": "release" },
            { "id": "1.20.4", "type": "release" }
        ])
    );
    assert_eq!(listing["snapshots"][0]["id"], "24w40a");
}

#[tokio::test]
async fn setup_slot_is_released_after_a_panic() {
    let server = spawn().await;
    let state = std::sync::Arc::clone(server.state());

    let task_state = std::sync::Arc::clone(&state);
    let task = tokio::spawn(async move {
        let _slot = task_state.begin_setup().unwrap();
        panic!("setup task failed");
    });
    assert!(task.await.unwrap_err().is_panic());

    let slot = state.begin_setup();
    assert!(slot.is_some());
    assert!(state.begin_setup().is_none());
    drop(slot);
    assert!(state.begin_setup().is_some());
}

#[tokio::test]
async fn blank_server_name_is_rejected() {
    let server = spawn().await;
    let response = post_json(
        &server.url("/api/servers"),
        &json!({ "name": "  ", "directory": server.root() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lifecycle_errors_map_to_status_codes() {
    let server = spawn().await;
    let dir = server.root().join("lobby");
    post_json(
        &server.url("/api/servers"),
        &json!({ "name": "lobby", "directory": dir }),
    )
    .await;

    let unknown = reqwest::get(server.url("/api/servers/ghost/status"))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let status: Value = reqwest::get(server.url("/api/servers/lobby/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        status,
        json!({ "name": "lobby", "state": "stopped", "exit_code": null })
    );

    let stop = post_json(&server.url("/api/servers/lobby/stop"), &json!({})).await;
    assert_eq!(stop.status(), StatusCode::CONFLICT);
    let body: Value = stop.json().await.unwrap();
    assert_eq!(body["status"], 409);
    assert_eq!(body["error"], "Server 'lobby' is not running");

    // No server.jar in the directory.
    let start = post_json(&server.url("/api/servers/lobby/start"), &json!({})).await;
    assert_eq!(start.status(), StatusCode::BAD_REQUEST);

    let command = post_json(
        &server.url("/api/servers/lobby/command"),
        &json!({ "command": "list" }),
    )
    .await;
    assert_eq!(command.status(), StatusCode::CONFLICT);

    let ghost_start = post_json(&server.url("/api/servers/ghost/start"), &json!({})).await;
    assert_eq!(ghost_start.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn console_of_idle_server_is_empty() {
    let server = spawn().await;
    post_json(
        &server.url("/api/servers"),
        &json!({ "name": "lobby", "directory": server.root() }),
    )
    .await;

    let console: Value = reqwest::get(server.url("/api/servers/lobby/console"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(console, json!({ "name": "lobby", "lines": [] }));

    let cleared = reqwest::Client::new()
        .delete(server.url("/api/servers/lobby/console"))
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);

    let missing = reqwest::get(server.url("/api/servers/ghost/console"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn properties_round_trip_in_file_order() {
    let server = spawn().await;
    let dir = server.root().join("creative");
    post_json(
        &server.url("/api/servers"),
        &json!({ "name": "creative", "directory": dir }),
    )
    .await;

    let url = server.url("/api/servers/creative/properties");
    let missing = reqwest::get(&url).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let put = reqwest::Client::new()
        .put(&url)
        .json(&json!({ "properties": { "server-port": "25566", "motd": "Hello", "gamemode": "creative" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::OK);

    let text = std::fs::read_to_string(dir.join("server.properties")).unwrap();
    assert_eq!(text, "server-port=25566\nmotd=Hello\ngamemode=creative\n");

    let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert_eq!(
        body,
        r#"{"properties":{"server-port":"25566","motd":"Hello","gamemode":"creative"}}"#
    );
}

#[cfg(unix)]
mod lifecycle {
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    use mcsm_runtime::ObserverKind;
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use super::post_json;
    use crate::common::{SseClient, spawn_with, test_settings};

    const COOPERATIVE: &str = r#"#!/bin/sh
echo "Starting minecraft server version 1.21.1"
while IFS= read -r line; do
  echo "Received: $line"
  if [ "$line" = "stop" ]; then
    exit 0
  fi
done
"#;

    #[tokio::test]
    async fn survival1_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let java = dir.path().join("fake-java");
        std::fs::write(&java, COOPERATIVE).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
        let server_dir = dir.path().join("survival1");
        std::fs::create_dir_all(&server_dir).unwrap();
        std::fs::write(server_dir.join("server.jar"), b"jar").unwrap();

        let mut settings = test_settings(dir.path());
        settings.java_path = java;
        let server = spawn_with(dir, settings).await;

        let mut events = SseClient::connect(&server.url("/api/events")).await;
        server.wait_for_observers(ObserverKind::Sse, 1).await;

        post_json(
            &server.url("/api/servers"),
            &json!({ "name": "survival1", "directory": server_dir }),
        )
        .await;

        let started: Value = post_json(&server.url("/api/servers/survival1/start"), &json!({}))
            .await
            .json()
            .await
            .unwrap();
        let pid = started["pid"].as_u64().unwrap();

        let status: Value = reqwest::get(server.url("/api/servers/survival1/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["state"], "running");
        assert_eq!(status["pid"].as_u64(), Some(pid));

        let sent = post_json(
            &server.url("/api/servers/survival1/command"),
            &json!({ "command": "list" }),
        )
        .await;
        assert_eq!(sent.status(), StatusCode::OK);

        // The echo arrives as a broadcast log line.
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), events.next_message())
                .await
                .unwrap()
                .unwrap();
            if event["message"] == "[survival1] Received: list" {
                assert_eq!(event["type"], "log");
                break;
            }
        }

        let edit = reqwest::Client::new()
            .put(server.url("/api/servers/survival1"))
            .json(&json!({ "directory": server_dir, "max_memory": "8G" }))
            .send()
            .await
            .unwrap();
        assert_eq!(edit.status(), StatusCode::CONFLICT);

        let stopped: Value = post_json(&server.url("/api/servers/survival1/stop"), &json!({}))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(
            stopped,
            json!({ "name": "survival1", "forced": false, "exit_code": 0 })
        );

        let console: Value = reqwest::get(server.url("/api/servers/survival1/console"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let lines = console["lines"].as_array().unwrap();
        assert!(lines.contains(&json!("> list")));
        assert_eq!(
            lines.last().unwrap(),
            "[Server 'survival1' stopped gracefully]"
        );
    }
}
