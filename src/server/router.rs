//! Router configuration for the chat server.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::ws::{chat_ws_handler, ChatState};

/// Create the main router: the WebSocket endpoint plus the health probe.
pub fn create_router(state: Arc<ChatState>) -> Router {
    Router::new()
        .route("/", get(chat_ws_handler))
        .with_state(state)
        .merge(create_health_router())
        .layer(TraceLayer::new_for_http())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
