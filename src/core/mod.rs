pub mod base;
pub mod llm;
pub mod registry;
pub mod session;
pub mod transcript;
pub mod tts;

pub use base::{
    AudioFrame, AudioStream, FragmentStream, PipelineError, PipelineResult, SpeechSynthesizer,
    TextFragment, TextGenerator, single_fragment,
};
pub use llm::{ChatConfig, ChatMode, OpenAIChat};
pub use registry::{ConnectionId, SessionRegistry};
pub use session::{ConversationSession, SessionState};
pub use transcript::{DEFAULT_SYSTEM_PROMPT, Role, Transcript, Turn};
pub use tts::{OpenAISpeech, SpeechConfig, SpeechRequestBody};
