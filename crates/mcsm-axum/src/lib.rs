//! Axum adapter for mcsm: the JSON API, the SSE streams and the WebSocket
//! transport, all fed from the same event queue.
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use reqwest as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_tungstenite as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;
pub mod ws;

// Re-export primary types
pub use bootstrap::{
    AxumContext, CorsConfig, RunningServer, ServerConfig, SetupSlot, bootstrap,
    bootstrap_with, spawn_server, start_server,
};
pub use error::HttpError;
pub use routes::{create_router, ws_router};
pub use state::AppState;
