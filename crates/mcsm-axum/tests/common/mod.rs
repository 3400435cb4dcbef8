//! Shared fixtures: a live server on ephemeral ports plus SSE and WebSocket
//! clients.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{SinkExt, StreamExt};
use mcsm_axum::{AppState, RunningServer, ServerConfig, bootstrap_with, spawn_server};
use mcsm_core::{ArtifactSource, ArtifactSpec, SetupError, Settings, VersionInfo, VersionListing};
use mcsm_runtime::ObserverKind;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Serves a fixed jar body for any version except `0.0.0`.
pub struct FixedSource {
    pub body: Vec<u8>,
}

#[async_trait]
impl ArtifactSource for FixedSource {
    async fn resolve(&self, version: &str) -> Result<ArtifactSpec, SetupError> {
        if version == "0.0.0" {
            return Err(SetupError::Resolve(format!("Unknown version: {version}")));
        }
        Ok(ArtifactSpec {
            version_id: "1.21.1".to_string(),
            url: "memory://server.jar".to_string(),
            sha1: None,
        })
    }

    async fn versions(&self) -> Result<VersionListing, SetupError> {
        let info = |id: &str, kind: &str| VersionInfo {
            id: id.to_string(),
            kind: kind.to_string(),
            release_time: None,
        };
        Ok(VersionListing {
            latest_release: "1.21.1".to_string(),
            latest_snapshot: "24w40a".to_string(),
            releases: vec![info("1.21.1", "release"), info("1.20.4", "release")],
            snapshots: vec![info("24w40a", "snapshot")],
        })
    }

    async fn download(&self, _url: &str, dest: &Path) -> Result<(), SetupError> {
        tokio::fs::write(dest, &self.body).await?;
        Ok(())
    }
}

pub fn test_settings(dir: &Path) -> Settings {
    let mut settings = Settings::with_defaults();
    settings.host = "127.0.0.1".to_string();
    settings.http_port = 0;
    settings.ws_port = 0;
    settings.poll_interval_ms = 200;
    settings.grace_period_secs = 5;
    settings.servers_file = dir.join("servers.json");
    settings
}

pub struct TestServer {
    pub dir: TempDir,
    pub server: RunningServer,
}

impl TestServer {
    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn state(&self) -> &AppState {
        &self.server.state
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.server.http_addr, path)
    }

    pub fn ws_url(&self) -> String {
        let port = self.server.ws_port().expect("WebSocket transport is up");
        format!("ws://127.0.0.1:{port}/ws")
    }

    /// Wait until `n` observers of `kind` are registered.
    pub async fn wait_for_observers(&self, kind: ObserverKind, n: usize) {
        for _ in 0..100 {
            if self.state().observers.count(kind) == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "expected {n} {kind:?} observers, have {}",
            self.state().observers.count(kind)
        );
    }
}

pub async fn spawn_with(dir: TempDir, settings: Settings) -> TestServer {
    let source = Arc::new(FixedSource {
        body: b"fake server jar".to_vec(),
    });
    let ctx = bootstrap_with(&ServerConfig::new(settings), source)
        .await
        .expect("bootstrap");
    let server = spawn_server(ctx, &mcsm_axum::CorsConfig::AllowAll)
        .await
        .expect("spawn server");
    TestServer { dir, server }
}

pub async fn spawn() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(dir.path());
    spawn_with(dir, settings).await
}

/// Minimal `text/event-stream` reader.
pub struct SseClient {
    stream: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buf: String,
}

impl SseClient {
    pub async fn connect(url: &str) -> Self {
        let response = reqwest::get(url).await.unwrap();
        assert!(response.status().is_success());
        Self {
            stream: response
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()))
                .boxed(),
            buf: String::new(),
        }
    }

    /// Next `data:` payload; `None` once the server closed the stream.
    pub async fn next_event(&mut self) -> Option<Value> {
        loop {
            if let Some(end) = self.buf.find("\n\n") {
                let block: String = self.buf.drain(..end + 2).collect();
                let data: Vec<&str> = block
                    .lines()
                    .filter_map(|line| line.strip_prefix("data:"))
                    .map(str::trim_start)
                    .collect();
                if data.is_empty() {
                    continue;
                }
                return Some(serde_json::from_str(&data.join("\n")).unwrap());
            }
            let chunk = tokio::time::timeout(READ_TIMEOUT, self.stream.next())
                .await
                .expect("SSE read timed out")?;
            self.buf.push_str(&String::from_utf8_lossy(&chunk.ok()?));
        }
    }

    /// Next event that is not a heartbeat.
    pub async fn next_message(&mut self) -> Option<Value> {
        loop {
            let event = self.next_event().await?;
            if event["type"] != "heartbeat" {
                return Some(event);
            }
        }
    }
}

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn ws_connect(url: &str) -> WsClient {
    let (ws, _) = connect_async(url).await.expect("WebSocket connect");
    ws
}

/// Next text frame parsed as JSON.
pub async fn ws_next(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(READ_TIMEOUT, ws.next())
            .await
            .expect("WebSocket read timed out")
            .expect("WebSocket closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

pub async fn ws_send(ws: &mut WsClient, text: &str) {
    ws.send(Message::Text(text.to_string())).await.unwrap();
}
