//! HTTP request handlers for the Axum web server.
//!
//! Handlers are thin wrappers over the supervisor, the setup workflow and the
//! observer registry held in [`AppState`](crate::state::AppState).

pub mod events;
pub mod properties;
pub mod servers;
pub mod setup;
pub mod system;
