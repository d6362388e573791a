use std::path::Path;

use serde::Deserialize;

use super::{ConfigError, ConfigResult};

/// Complete YAML configuration structure
///
/// Every field is optional; whatever is present overrides the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///
/// openai:
///   api_key: "sk-..."
///   base_url: "https://api.openai.com/v1"
///
/// chat:
///   mode: "streaming"
///   model: "gpt-4o-mini"
///   system_prompt: "You are a helpful assistant."
///   temperature: 0.7
///   max_tokens: 512
///
/// speech:
///   model: "gpt-4o-mini-tts"
///   voice: "coral"
///   format: "pcm"
///   instructions: "Speak in a cheerful and positive tone."
///   speed: 1.0
///   frame_size: 4096
///
/// limits:
///   http_connect_timeout_seconds: 10
///   ws_idle_timeout_seconds: 300
///   max_text_bytes: 16384
///
/// security:
///   cors_allowed_origins: "https://app.example.com"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub chat: Option<ChatYaml>,
    pub speech: Option<SpeechYaml>,
    pub limits: Option<LimitsYaml>,
    pub security: Option<SecurityYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Reply generation settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ChatYaml {
    /// `streaming`, `complete` or `sdk`
    pub mode: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Speech synthesis settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechYaml {
    pub model: Option<String>,
    pub voice: Option<String>,
    pub format: Option<String>,
    /// An empty string turns instructions off
    pub instructions: Option<String>,
    pub speed: Option<f32>,
    pub frame_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LimitsYaml {
    pub http_connect_timeout_seconds: Option<u64>,
    pub ws_idle_timeout_seconds: Option<u64>,
    pub max_text_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load a YAML configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid YAML for
    /// this structure.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse YAML text. An empty document yields an empty configuration.
    pub fn from_yaml_str(contents: &str) -> ConfigResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}
