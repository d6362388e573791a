//! Chat WebSocket message types
//!
//! Wire protocol:
//!
//! - Client → server: one UTF-8 text frame per utterance, or the
//!   [`INTERRUPT_COMMAND`] control text
//! - Server → client: binary frames of audio, then [`DONE_SENTINEL`] on
//!   success or one text frame starting with [`ERROR_PREFIX`] on failure

use bytes::Bytes;
use thiserror::Error;

/// Sent after the last audio frame of a successful reply
pub const DONE_SENTINEL: &str = "__done__";

/// Client control text that abandons the reply in progress
pub const INTERRUPT_COMMAND: &str = "__interrupt__";

/// Prefix of every error text frame
pub const ERROR_PREFIX: &str = "Error: ";

/// Format an error text frame.
pub fn error_text(description: impl std::fmt::Display) -> String {
    format!("{ERROR_PREFIX}{description}")
}

// =============================================================================
// Inbound
// =============================================================================

/// Parsed client text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// A user utterance to answer
    Utterance(String),
    /// Abandon the in-flight reply
    Interrupt,
}

/// Why a client text frame was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboundRejection {
    #[error("message is empty")]
    Empty,
    #[error("message exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

impl ClientMessage {
    pub fn parse(text: &str, max_bytes: usize) -> Result<Self, InboundRejection> {
        if text.len() > max_bytes {
            return Err(InboundRejection::TooLarge { limit: max_bytes });
        }
        if text.trim().is_empty() {
            return Err(InboundRejection::Empty);
        }
        if text.trim() == INTERRUPT_COMMAND {
            return Ok(Self::Interrupt);
        }
        Ok(Self::Utterance(text.to_string()))
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Work items for the socket sender task.
#[derive(Debug)]
pub enum ChatMessageRoute {
    /// One audio frame
    Audio(Bytes),
    /// A control or error text frame
    Text(String),
    /// Close the socket
    Close,
}

impl ChatMessageRoute {
    pub fn done() -> Self {
        Self::Text(DONE_SENTINEL.to_string())
    }

    pub fn error(description: impl std::fmt::Display) -> Self {
        Self::Text(error_text(description))
    }
}
