//! Background server setup.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use mcsm_core::VersionListing;
use mcsm_runtime::{SetupRequest, run_setup};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::HttpError;
use crate::state::AppState;

/// Kick off setup and return at once; progress flows through the event queue
/// to `/api/progress`, `/api/events` and the WebSocket.
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<SetupRequest>,
) -> Result<Json<Value>, HttpError> {
    let Some(slot) = state.begin_setup() else {
        return Err(HttpError::Conflict("A setup is already running".to_string()));
    };

    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        let _slot = slot;
        let result = run_setup(
            &request,
            task_state.artifacts.as_ref(),
            &task_state.events,
        )
        .await;
        // The workflow already reported the terminal event.
        if let Err(e) = result {
            debug!(error = %e, "Setup task ended with an error");
        }
    });

    Ok(Json(json!({ "status": "started" })))
}

/// Installable versions for the setup form.
pub async fn versions(State(state): State<AppState>) -> Result<Json<VersionListing>, HttpError> {
    Ok(Json(state.artifacts.versions().await?))
}
