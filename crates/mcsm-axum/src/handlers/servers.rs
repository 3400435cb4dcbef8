//! Server handlers - catalog and lifecycle operations.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use mcsm_core::{ServerDefinition, unique_name};
use mcsm_runtime::{ProcessStatus, ServerSummary, StopOutcome};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::HttpError;
use crate::state::AppState;

/// List every registered server with its status.
pub async fn list(State(state): State<AppState>) -> Json<Vec<ServerSummary>> {
    Json(state.supervisor.list())
}

/// Register a new server. A taken name gets a `_2`, `_3`, ... suffix.
pub async fn create(
    State(state): State<AppState>,
    Json(mut definition): Json<ServerDefinition>,
) -> Result<(StatusCode, Json<ServerDefinition>), HttpError> {
    let requested = definition.name.trim();
    if requested.is_empty() || requested.contains('/') {
        return Err(HttpError::BadRequest(format!(
            "Invalid server name: {:?}",
            definition.name
        )));
    }

    let existing = state.supervisor.definitions();
    definition.name = unique_name(requested, existing.iter().map(|d| d.name.as_str()));
    state.supervisor.register(definition.clone());
    state.persist_definitions()?;

    info!(name = %definition.name, dir = %definition.directory.display(), "Server registered");
    Ok((StatusCode::CREATED, Json(definition)))
}

/// Replace a stopped server's definition. The path names the server.
pub async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(mut definition): Json<ServerDefinition>,
) -> Result<Json<ServerDefinition>, HttpError> {
    definition.name = name;
    let definition = state.supervisor.update(definition).await?;
    state.persist_definitions()?;

    info!(name = %definition.name, dir = %definition.directory.display(), "Server updated");
    Ok(Json(definition))
}

/// Stop (if running) and forget a server.
pub async fn remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ServerDefinition>, HttpError> {
    let definition = state.supervisor.unregister(&name).await?;
    state.persist_definitions()?;
    info!(name = %name, "Server removed");
    Ok(Json(definition))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub name: String,
    #[serde(flatten)]
    pub status: ProcessStatus,
}

/// Status of one server. Registered servers that never ran report `stopped`.
pub async fn status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, HttpError> {
    let status = match state.supervisor.status(&name) {
        ProcessStatus::NotFound if state.supervisor.definition(&name).is_none() => {
            return Err(HttpError::NotFound(format!("Server '{name}' not found")));
        }
        ProcessStatus::NotFound => ProcessStatus::Stopped { exit_code: None },
        status => status,
    };
    Ok(Json(StatusResponse { name, status }))
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub name: String,
    pub pid: u32,
}

pub async fn start(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StartResponse>, HttpError> {
    let pid = state.supervisor.start(&name).await?;
    Ok(Json(StartResponse { name, pid }))
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub name: String,
    #[serde(flatten)]
    pub outcome: StopOutcome,
}

/// Graceful stop; blocks up to the grace period before forcing.
pub async fn stop(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StopResponse>, HttpError> {
    let outcome = state.supervisor.stop(&name).await?;
    if outcome.forced {
        warn!(name = %name, "Server ignored the stop command and was killed");
    }
    Ok(Json(StopResponse { name, outcome }))
}

pub async fn restart(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StartResponse>, HttpError> {
    let pid = state.supervisor.restart(&name).await?;
    Ok(Json(StartResponse { name, pid }))
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Write one console command to the server's stdin.
pub async fn command(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<serde_json::Value>, HttpError> {
    state.supervisor.send_command(&name, &req.command).await?;
    Ok(Json(serde_json::json!({ "status": "sent" })))
}

#[derive(Debug, Serialize)]
pub struct ConsoleResponse {
    pub name: String,
    pub lines: Vec<String>,
}

pub async fn console(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ConsoleResponse>, HttpError> {
    let lines = state.supervisor.console(&name)?;
    Ok(Json(ConsoleResponse { name, lines }))
}

pub async fn clear_console(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.supervisor.clear_console(&name)?;
    Ok(StatusCode::NO_CONTENT)
}
