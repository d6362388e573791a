//! Wire types for the OpenAI Chat Completions API.
//!
//! Only the fields the gateway reads are modelled; everything else in the
//! response payloads is ignored by serde.

use serde::{Deserialize, Serialize};

use crate::core::transcript::Turn;

/// Terminal marker of a streamed completion
pub const STREAM_DONE_MARKER: &str = "[DONE]";

// =============================================================================
// Request
// =============================================================================

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Turn],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

// =============================================================================
// Streaming Response
// =============================================================================

/// One `data:` event of a streamed completion.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Some providers report failures inside the stream instead of via status
    #[serde(default)]
    pub error: Option<OpenAIError>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Content delta of the first choice, if it carries any text.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

// =============================================================================
// Complete Response
// =============================================================================

/// Response body of a non-streamed completion.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseChoice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Full reply text of the first choice.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// OpenAI error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIError,
}

/// OpenAI API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl std::fmt::Display for OpenAIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_type {
            Some(error_type) => write!(f, "{} ({})", self.message, error_type),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Describe a non-success response, preferring the OpenAI error envelope.
pub fn describe_error_body(status: u16, body: &str) -> String {
    match serde_json::from_str::<OpenAIErrorResponse>(body) {
        Ok(envelope) => format!("OpenAI API error ({status}): {}", envelope.error),
        Err(_) => format!("OpenAI API error ({status}): {body}"),
    }
}
