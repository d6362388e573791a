//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `chat` - Text-in, audio-out conversation WebSocket

pub mod api;
pub mod chat;

pub use chat::chat_handler;
