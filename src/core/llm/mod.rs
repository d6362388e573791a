//! Text generation via OpenAI-compatible chat completions.

mod client;
mod config;
pub mod messages;

pub use client::OpenAIChat;
pub use config::{ChatConfig, ChatMode, DEFAULT_CHAT_MODEL, DEFAULT_OPENAI_BASE_URL};
