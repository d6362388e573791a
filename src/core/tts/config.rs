//! Configuration types for the OpenAI Audio Speech endpoint.

use serde::{Deserialize, Serialize};

use crate::core::base::redacted;
use crate::core::llm::DEFAULT_OPENAI_BASE_URL;

/// Default delivery instructions sent with every synthesis request
pub const DEFAULT_INSTRUCTIONS: &str = "Speak in a cheerful and positive tone.";

/// Default size of one outbound audio frame in bytes
pub const DEFAULT_FRAME_SIZE: usize = 4096;

/// Accepted speaking speed range
pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;

// =============================================================================
// Models
// =============================================================================

/// Speech models served by `/audio/speech`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeechModel {
    #[serde(rename = "tts-1")]
    Tts1,
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
    /// Only model that honours `instructions`
    #[default]
    #[serde(rename = "gpt-4o-mini-tts")]
    Gpt4oMiniTts,
}

impl SpeechModel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
            Self::Gpt4oMiniTts => "gpt-4o-mini-tts",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tts-1" => Some(Self::Tts1),
            "tts-1-hd" => Some(Self::Tts1Hd),
            "gpt-4o-mini-tts" => Some(Self::Gpt4oMiniTts),
            _ => None,
        }
    }

    /// Whether the model accepts the `instructions` field.
    #[inline]
    pub fn supports_instructions(&self) -> bool {
        matches!(self, Self::Gpt4oMiniTts)
    }
}

impl std::fmt::Display for SpeechModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Voices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechVoice {
    Alloy,
    Ash,
    Ballad,
    #[default]
    Coral,
    Echo,
    Fable,
    Onyx,
    Nova,
    Sage,
    Shimmer,
    Verse,
}

impl SpeechVoice {
    pub const ALL: [SpeechVoice; 11] = [
        Self::Alloy,
        Self::Ash,
        Self::Ballad,
        Self::Coral,
        Self::Echo,
        Self::Fable,
        Self::Onyx,
        Self::Nova,
        Self::Sage,
        Self::Shimmer,
        Self::Verse,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|voice| voice.as_str() == wanted)
    }
}

impl std::fmt::Display for SpeechVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Output Format
// =============================================================================

/// Encoding of the synthesized audio.
///
/// The gateway forwards bytes untouched; `Pcm` is raw 24 kHz 16-bit mono
/// little-endian and is what clients of `/chat` expect by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechFormat {
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    #[default]
    Pcm,
}

impl SpeechFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "opus" => Some(Self::Opus),
            "aac" => Some(Self::Aac),
            "flac" => Some(Self::Flac),
            "wav" => Some(Self::Wav),
            "pcm" | "raw" => Some(Self::Pcm),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpeechFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Synthesizer Configuration
// =============================================================================

/// Settings for [`OpenAISpeech`](super::OpenAISpeech).
#[derive(Clone, PartialEq)]
pub struct SpeechConfig {
    pub api_key: String,
    /// Base URL; `/audio/speech` is appended
    pub base_url: String,
    pub model: SpeechModel,
    pub voice: SpeechVoice,
    pub format: SpeechFormat,
    /// Delivery instructions; dropped for models that ignore them
    pub instructions: Option<String>,
    /// Speaking speed, clamped to 0.25..=4.0
    pub speed: f32,
    /// Size of outbound audio frames in bytes
    pub frame_size: usize,
}

impl SpeechConfig {
    pub fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.base_url.trim_end_matches('/'))
    }

    /// Speed to send, or `None` when it is the service default.
    pub fn effective_speed(&self) -> Option<f32> {
        let speed = self.speed.clamp(MIN_SPEED, MAX_SPEED);
        ((speed - 1.0).abs() > 0.001).then_some(speed)
    }

    /// Instructions to send, or `None` when unset or unsupported by the model.
    pub fn effective_instructions(&self) -> Option<&str> {
        self.instructions
            .as_deref()
            .filter(|text| !text.trim().is_empty() && self.model.supports_instructions())
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("format", &self.format)
            .field("instructions", &self.instructions)
            .field("speed", &self.speed)
            .field("frame_size", &self.frame_size)
            .finish()
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: SpeechModel::default(),
            voice: SpeechVoice::default(),
            format: SpeechFormat::default(),
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
            speed: 1.0,
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }
}
