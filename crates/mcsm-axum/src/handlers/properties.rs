//! `server.properties` of a registered server.

use axum::Json;
use axum::extract::{Path, State};
use mcsm_core::{ServerDefinition, ServerProperties};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HttpError;
use crate::state::AppState;

/// Properties in file order.
#[derive(Debug, Serialize, Deserialize)]
pub struct PropertiesBody {
    pub properties: ServerProperties,
}

fn definition(state: &AppState, name: &str) -> Result<ServerDefinition, HttpError> {
    state
        .supervisor
        .definition(name)
        .ok_or_else(|| HttpError::NotFound(format!("Server '{name}' not found")))
}

pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PropertiesBody>, HttpError> {
    let definition = definition(&state, &name)?;
    let properties = ServerProperties::load(&definition.directory)?;
    Ok(Json(PropertiesBody { properties }))
}

/// Replace the whole file with the given entries.
pub async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<PropertiesBody>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let definition = definition(&state, &name)?;
    body.properties.save(&definition.directory)?;
    info!(name = %name, entries = body.properties.len(), "server.properties written");
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
