//! Server directory setup: resolve, download, verify, EULA and start scripts.
//!
//! Every step reports a `progress` event; the run ends with exactly one
//! terminal `success` or `error` event.

use std::path::{Path, PathBuf};

use mcsm_core::{ArtifactSource, DEFAULT_JAR_NAME, Event, EventSink, SetupError};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

const EULA_FILE: &str = "eula.txt";

/// Parameters of one setup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default = "default_version")]
    pub version: String,
    pub server_dir: PathBuf,
    #[serde(default = "default_min_memory")]
    pub min_memory: String,
    #[serde(default = "default_max_memory")]
    pub max_memory: String,
    #[serde(default)]
    pub accept_eula: bool,
    #[serde(default)]
    pub force_download: bool,
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_min_memory() -> String {
    "1G".to_string()
}

fn default_max_memory() -> String {
    "2G".to_string()
}

impl SetupRequest {
    pub fn new(server_dir: impl Into<PathBuf>) -> Self {
        Self {
            version: default_version(),
            server_dir: server_dir.into(),
            min_memory: default_min_memory(),
            max_memory: default_max_memory(),
            accept_eula: false,
            force_download: false,
        }
    }
}

/// What a successful setup produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub version_id: String,
    pub jar_path: PathBuf,
    pub downloaded: bool,
}

/// Run the setup workflow, reporting progress to `sink`.
///
/// Failures are reported as a terminal `error` event before being returned.
pub async fn run_setup(
    request: &SetupRequest,
    source: &dyn ArtifactSource,
    sink: &dyn EventSink,
) -> Result<SetupReport, SetupError> {
    match setup_steps(request, source, sink).await {
        Ok(report) => {
            info!(version = %report.version_id, dir = %request.server_dir.display(), "Setup complete");
            sink.report(Event::success("Setup complete!"));
            Ok(report)
        }
        Err(e) => {
            warn!(dir = %request.server_dir.display(), error = %e, "Setup failed");
            sink.report(Event::error(e.to_string()));
            Err(e)
        }
    }
}

async fn setup_steps(
    request: &SetupRequest,
    source: &dyn ArtifactSource,
    sink: &dyn EventSink,
) -> Result<SetupReport, SetupError> {
    sink.report(Event::progress("Starting setup...", 0));

    let dir = &request.server_dir;
    tokio::fs::create_dir_all(dir).await?;
    sink.report(Event::progress(
        format!("Created directory: {}", dir.display()),
        10,
    ));

    sink.report(Event::progress(
        format!("Resolving version '{}'...", request.version),
        20,
    ));
    let artifact = source.resolve(&request.version).await?;
    sink.report(Event::progress(
        format!("Resolved version: {}", artifact.version_id),
        30,
    ));

    let jar_path = dir.join(DEFAULT_JAR_NAME);
    let exists = tokio::fs::try_exists(&jar_path).await?;
    let downloaded = if exists && !request.force_download {
        sink.report(Event::progress(
            "server.jar already exists, skipping download",
            60,
        ));
        false
    } else {
        sink.report(Event::progress("Downloading server.jar...", 40));
        source.download(&artifact.url, &jar_path).await?;
        sink.report(Event::progress("Download complete", 60));
        true
    };

    if let Some(expected) = artifact.sha1.as_deref() {
        sink.report(Event::progress("Verifying SHA1...", 70));
        let actual = sha1_file(&jar_path).await?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(SetupError::ChecksumMismatch {
                expected: expected.to_ascii_lowercase(),
                actual,
            });
        }
        sink.report(Event::progress("SHA1 verified", 80));
    }

    write_eula(dir, request.accept_eula).await?;
    sink.report(Event::progress(format!("EULA written to {EULA_FILE}"), 90));

    write_start_scripts(dir, &request.min_memory, &request.max_memory).await?;
    sink.report(Event::progress("Created start scripts", 95));

    Ok(SetupReport {
        version_id: artifact.version_id,
        jar_path,
        downloaded,
    })
}

/// Lowercase hex SHA-1 of a file.
pub async fn sha1_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

async fn write_eula(dir: &Path, accepted: bool) -> std::io::Result<()> {
    let contents = format!(
        "#By changing the setting below to TRUE you are indicating your agreement to our EULA (https://aka.ms/MinecraftEULA).\neula={accepted}\n"
    );
    tokio::fs::write(dir.join(EULA_FILE), contents).await
}

async fn write_start_scripts(dir: &Path, min_memory: &str, max_memory: &str) -> std::io::Result<()> {
    let java_args = format!("-Xms{min_memory} -Xmx{max_memory} -jar {DEFAULT_JAR_NAME} nogui");

    let sh_path = dir.join("start.sh");
    tokio::fs::write(
        &sh_path,
        format!("#!/bin/sh\ncd \"$(dirname \"$0\")\"\nexec java {java_args}\n"),
    )
    .await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&sh_path, std::fs::Permissions::from_mode(0o755)).await?;
    }

    tokio::fs::write(
        dir.join("start.bat"),
        format!("@echo off\r\ncd /d \"%~dp0\"\r\njava {java_args}\r\npause\r\n"),
    )
    .await
}
