//! Configuration types for the chat completion client.

use serde::{Deserialize, Serialize};

use crate::core::base::redacted;

/// Default OpenAI-compatible API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

// =============================================================================
// Chat Mode
// =============================================================================

/// How replies are fetched from the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// One request, one complete reply presented as a single fragment
    #[default]
    Complete,
    /// Server-Sent Events, one fragment per content delta
    Streaming,
}

impl ChatMode {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Streaming => "streaming",
        }
    }

    /// Parse a mode name. `sdk` is accepted as an alias of `complete`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "complete" | "sdk" | "blocking" => Some(Self::Complete),
            "streaming" | "stream" => Some(Self::Streaming),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Settings for [`OpenAIChat`](super::OpenAIChat).
#[derive(Clone, PartialEq)]
pub struct ChatConfig {
    /// Bearer token for the API
    pub api_key: String,
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Streaming or complete replies
    pub mode: ChatMode,
    /// Sampling temperature (omitted from the request when `None`)
    pub temperature: Option<f32>,
    /// Reply length cap (omitted from the request when `None`)
    pub max_tokens: Option<u32>,
}

impl ChatConfig {
    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("mode", &self.mode)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            mode: ChatMode::default(),
            temperature: None,
            max_tokens: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_mode_parsing() {
        assert_eq!(ChatMode::parse("streaming"), Some(ChatMode::Streaming));
        assert_eq!(ChatMode::parse("SDK"), Some(ChatMode::Complete));
        assert_eq!(ChatMode::parse(" complete "), Some(ChatMode::Complete));
        assert_eq!(ChatMode::parse("batch"), None);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = ChatConfig {
            api_key: "sk-secret-123".to_string(),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret-123"));
        assert!(printed.contains("[REDACTED]"));
        assert!(printed.contains("gpt-4o-mini"));
    }

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        let config = ChatConfig {
            base_url: "http://127.0.0.1:9000/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.completions_url(),
            "http://127.0.0.1:9000/v1/chat/completions"
        );
    }
}
