//! Route definitions and router construction.
//!
//! Axum 0.8 uses brace syntax for path parameters: `{name}`.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::CorsConfig;
use crate::handlers;
use crate::state::AppState;
use crate::ws;

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// API routes without the `/api` prefix, for nesting.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // System
        .route("/websocket-info", get(handlers::system::websocket_info))
        .route("/java-check", get(handlers::system::java_check))
        // Server catalog
        .route(
            "/servers",
            get(handlers::servers::list).post(handlers::servers::create),
        )
        .route(
            "/servers/{name}",
            delete(handlers::servers::remove).put(handlers::servers::update),
        )
        // Lifecycle
        .route("/servers/{name}/status", get(handlers::servers::status))
        .route("/servers/{name}/start", post(handlers::servers::start))
        .route("/servers/{name}/stop", post(handlers::servers::stop))
        .route("/servers/{name}/restart", post(handlers::servers::restart))
        .route("/servers/{name}/command", post(handlers::servers::command))
        .route(
            "/servers/{name}/console",
            get(handlers::servers::console).delete(handlers::servers::clear_console),
        )
        .route(
            "/servers/{name}/properties",
            get(handlers::properties::get).put(handlers::properties::update),
        )
        // Setup
        .route("/versions", get(handlers::setup::versions))
        .route("/setup", post(handlers::setup::start))
        // Events (SSE)
        .route("/events", get(handlers::events::stream))
        .route("/progress", get(handlers::events::progress))
}

/// The HTTP API router: `/health` plus everything under `/api`.
pub fn create_router(state: AppState, cors_config: &CorsConfig) -> Router {
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(handlers::system::health))
        .nest("/api", api_routes().layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The WebSocket transport router, served on its own negotiated port.
///
/// Clients may connect to `/` or `/ws`.
pub fn ws_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws::upgrade))
        .route("/ws", get(ws::upgrade))
        .with_state(state)
}
