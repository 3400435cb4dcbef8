//! Shared application state type.

use crate::bootstrap::AxumContext;
use std::sync::Arc;

/// State shared by the HTTP and WebSocket routers.
pub type AppState = Arc<AxumContext>;
