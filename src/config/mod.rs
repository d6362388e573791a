//! Configuration module for the voice chat gateway
//!
//! Server configuration is assembled from several sources.
//! Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voice_chat_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variables as the base
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::base::redacted;
use crate::core::llm::{ChatConfig, ChatMode, DEFAULT_CHAT_MODEL, DEFAULT_OPENAI_BASE_URL};
use crate::core::transcript::DEFAULT_SYSTEM_PROMPT;
use crate::core::tts::{
    DEFAULT_FRAME_SIZE, DEFAULT_INSTRUCTIONS, SpeechConfig, SpeechFormat, SpeechModel, SpeechVoice,
};

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Default listen host
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;
/// Default upstream connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;
/// Default WebSocket idle timeout
pub const DEFAULT_IDLE_TIMEOUT_SECONDS: u64 = 300;
/// Default cap on one inbound utterance
pub const DEFAULT_MAX_TEXT_BYTES: usize = 16 * 1024;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value:?} (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Server Configuration
// =============================================================================

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Listen address
/// - OpenAI credentials and endpoint
/// - Reply generation settings
/// - Speech synthesis settings
/// - Connection limits and CORS
#[derive(Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // OpenAI
    /// Bearer token used for both chat and speech requests
    pub openai_api_key: String,
    /// API base URL shared by both endpoints
    pub openai_base_url: String,

    // Generation
    pub chat_mode: ChatMode,
    pub chat_model: String,
    /// First turn of every new transcript
    pub system_prompt: String,
    pub chat_temperature: Option<f32>,
    pub chat_max_tokens: Option<u32>,

    // Synthesis
    pub tts_model: SpeechModel,
    pub tts_voice: SpeechVoice,
    pub tts_format: SpeechFormat,
    /// Delivery instructions; empty disables them
    pub tts_instructions: Option<String>,
    pub tts_speed: f32,
    /// Bytes per outbound audio frame
    pub audio_frame_size: usize,

    // Connections
    pub http_connect_timeout_seconds: u64,
    /// Close WebSocket connections that stay silent this long
    pub ws_idle_timeout_seconds: u64,
    /// Largest accepted utterance in bytes
    pub max_text_bytes: usize,
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("openai_api_key", &redacted(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("chat_mode", &self.chat_mode)
            .field("chat_model", &self.chat_model)
            .field("system_prompt", &self.system_prompt)
            .field("chat_temperature", &self.chat_temperature)
            .field("chat_max_tokens", &self.chat_max_tokens)
            .field("tts_model", &self.tts_model)
            .field("tts_voice", &self.tts_voice)
            .field("tts_format", &self.tts_format)
            .field("tts_instructions", &self.tts_instructions)
            .field("tts_speed", &self.tts_speed)
            .field("audio_frame_size", &self.audio_frame_size)
            .field("http_connect_timeout_seconds", &self.http_connect_timeout_seconds)
            .field("ws_idle_timeout_seconds", &self.ws_idle_timeout_seconds)
            .field("max_text_bytes", &self.max_text_bytes)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

/// Clear the API key from memory when the configuration goes away.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.openai_api_key.zeroize();
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            openai_api_key: String::new(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chat_mode: ChatMode::default(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            chat_temperature: None,
            chat_max_tokens: None,
            tts_model: SpeechModel::default(),
            tts_voice: SpeechVoice::default(),
            tts_format: SpeechFormat::default(),
            tts_instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
            tts_speed: 1.0,
            audio_frame_size: DEFAULT_FRAME_SIZE,
            http_connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT_SECONDS,
            ws_idle_timeout_seconds: DEFAULT_IDLE_TIMEOUT_SECONDS,
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// The `.env` file is loaded by `main` before this is called, so its
    /// values show up as regular environment variables here.
    pub fn from_env() -> ConfigResult<Self> {
        let config = env::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with the environment as base.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the final configuration for values the gateway cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        validation::validate_api_key(&self.openai_api_key)?;
        validation::validate_base_url("openai.base_url", &self.openai_base_url)?;
        validation::validate_chat_settings(
            &self.chat_model,
            self.chat_temperature,
            self.chat_max_tokens,
        )?;
        validation::validate_speech_settings(self.tts_speed, self.audio_frame_size)?;
        validation::validate_limits(
            self.http_connect_timeout_seconds,
            self.ws_idle_timeout_seconds,
            self.max_text_bytes,
        )?;
        Ok(())
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http_connect_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_idle_timeout_seconds)
    }

    /// Settings for the chat completion client
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.chat_model.clone(),
            mode: self.chat_mode,
            temperature: self.chat_temperature,
            max_tokens: self.chat_max_tokens,
        }
    }

    /// Settings for the speech synthesizer
    pub fn speech_config(&self) -> SpeechConfig {
        SpeechConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.tts_model,
            voice: self.tts_voice,
            format: self.tts_format,
            instructions: self.tts_instructions.clone(),
            speed: self.tts_speed,
            frame_size: self.audio_frame_size,
        }
    }
}
