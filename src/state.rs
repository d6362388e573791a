//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::core::{
    ConversationSession, OpenAIChat, OpenAISpeech, SessionRegistry, SpeechSynthesizer,
    TextGenerator,
};

/// Idle pooled connections to the OpenAI API are kept this long
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// State shared by every route.
pub struct AppState {
    pub config: ServerConfig,
    pub generator: Arc<dyn TextGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Build the state with OpenAI clients sharing one connection pool.
    pub fn new(config: ServerConfig) -> reqwest::Result<Arc<Self>> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_nodelay(true)
            .build()?;

        let generator = Arc::new(OpenAIChat::new(config.chat_config(), http.clone()));
        let synthesizer = Arc::new(OpenAISpeech::new(config.speech_config(), http));

        info!(
            chat_mode = %config.chat_mode,
            chat_model = %config.chat_model,
            tts_model = %config.tts_model,
            tts_voice = %config.tts_voice,
            "Pipeline clients initialized"
        );

        Ok(Self::with_providers(config, generator, synthesizer))
    }

    /// Build the state around caller-supplied generator and synthesizer.
    pub fn with_providers(
        config: ServerConfig,
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            generator,
            synthesizer,
            sessions: SessionRegistry::new(),
        })
    }

    /// Create an idle session for a new connection and register it.
    pub fn open_session(&self) -> Arc<ConversationSession> {
        let session = Arc::new(ConversationSession::new(
            Uuid::new_v4(),
            self.config.system_prompt.clone(),
            self.generator.clone(),
            self.synthesizer.clone(),
        ));
        self.sessions.insert(session.clone());
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionState;

    fn test_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.openai_api_key = "sk-test".to_string();
        config.system_prompt = "Be brief.".to_string();
        config
    }

    #[tokio::test]
    async fn test_open_session_registers_idle_session() {
        let state = AppState::new(test_config()).unwrap();

        let session = state.open_session();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.transcript().turns()[0].content, "Be brief.");
        assert!(state.sessions.contains(&session.id()));
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_ids() {
        let state = AppState::new(test_config()).unwrap();
        let first = state.open_session();
        let second = state.open_session();
        assert_ne!(first.id(), second.id());
        assert_eq!(state.sessions.len(), 2);
    }
}
