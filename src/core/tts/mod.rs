//! Speech synthesis via the OpenAI Audio Speech endpoint.

mod body;
mod config;
mod framing;
mod provider;

pub use body::SpeechRequestBody;
pub use config::{
    DEFAULT_FRAME_SIZE, DEFAULT_INSTRUCTIONS, MAX_SPEED, MIN_SPEED, SpeechConfig, SpeechFormat,
    SpeechModel, SpeechVoice,
};
pub use framing::FrameChunker;
pub use provider::OpenAISpeech;
