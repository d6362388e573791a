//! Chat WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::chat_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the chat WebSocket router
///
/// # Endpoint
///
/// `GET /chat` - WebSocket upgrade for text-in, audio-out conversation
///
/// # Example
///
/// ```text
/// → "hello"
/// ← <binary audio frame>
/// ← <binary audio frame>
/// ← "__done__"
/// ```
pub fn create_chat_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", get(chat_handler))
        .layer(TraceLayer::new_for_http())
}
