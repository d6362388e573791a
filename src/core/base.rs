//! Base traits and types for the chat-to-speech pipeline.
//!
//! This module defines the two streaming seams of the gateway:
//!
//! - [`TextGenerator`] turns a transcript into a lazy sequence of text fragments
//! - [`SpeechSynthesizer`] turns a lazy sequence of text fragments into a lazy
//!   sequence of audio frames
//!
//! Both sequences are boxed `'static` streams so that a session can chain them
//! without borrowing itself for the duration of a turn.

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;

use super::transcript::Turn;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while producing one reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Text generation failed (unreachable, non-success status, malformed or truncated stream)
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Speech synthesis failed; `status` is `None` when no response was received
    #[error("Synthesis failed ({}): {body}", describe_status(.status))]
    Synthesis { status: Option<u16>, body: String },

    /// A turn is already in flight on this session
    #[error("Session busy: a reply is already in progress")]
    SessionBusy,

    /// The session failed earlier and cannot serve new turns
    #[error("Session failed: a new connection is required")]
    SessionFailed,

    /// The client connection itself failed
    #[error("Transport error: {0}")]
    Transport(String),
}

impl PipelineError {
    /// Sanitized description suitable for the end user.
    ///
    /// Remote error bodies and transport details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Generation(_) => "failed to generate a reply",
            Self::Synthesis { .. } => "speech synthesis failed",
            Self::SessionBusy => "a reply is already in progress",
            Self::SessionFailed => "session is no longer usable, please reconnect",
            Self::Transport(_) => "connection error",
        }
    }
}

fn describe_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| s.to_string())
}

/// Stand-in for a credential in `Debug` output.
pub(crate) fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "[REDACTED]" }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

// =============================================================================
// Stream Types
// =============================================================================

/// One non-empty piece of generated text.
pub type TextFragment = String;

/// One chunk of raw synthesized audio.
pub type AudioFrame = Bytes;

/// Lazy, finite, forward-only sequence of text fragments.
pub type FragmentStream = BoxStream<'static, PipelineResult<TextFragment>>;

/// Lazy, finite, forward-only sequence of audio frames.
pub type AudioStream = BoxStream<'static, PipelineResult<AudioFrame>>;

/// Wrap one complete string as a one-element fragment sequence.
///
/// An empty string produces an empty sequence, since fragments are never empty.
pub fn single_fragment(text: impl Into<String>) -> FragmentStream {
    let text = text.into();
    if text.is_empty() {
        stream::empty().boxed()
    } else {
        stream::once(async move { Ok(text) }).boxed()
    }
}

// =============================================================================
// Provider Traits
// =============================================================================

/// Remote text generation.
///
/// Implementations are stateless: the full conversation is passed on every call.
/// The returned stream must end with an error, never silently, when the remote
/// side stops before its terminal marker.
pub trait TextGenerator: Send + Sync {
    /// Start generating a reply for the given turns.
    fn generate(&self, turns: Vec<Turn>) -> FragmentStream;
}

/// Remote speech synthesis fed by a live fragment sequence.
pub trait SpeechSynthesizer: Send + Sync {
    /// Start synthesizing the text produced by `fragments`.
    ///
    /// If `fragments` fails, the outgoing request is aborted and the same
    /// error is yielded from the returned stream.
    fn synthesize(&self, fragments: FragmentStream) -> AudioStream;
}
