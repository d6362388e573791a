//! Applying YAML overrides on top of the environment configuration.

use super::env::{
    CHAT_MODES, SPEECH_FORMATS, SPEECH_MODELS, SPEECH_VOICES, load_from_env, parse_named,
};
use super::yaml::YamlConfig;
use super::{ConfigResult, ServerConfig};
use crate::core::llm::ChatMode;
use crate::core::tts::{SpeechFormat, SpeechModel, SpeechVoice};

/// Build the final configuration: environment first, then YAML on top.
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> ConfigResult<ServerConfig> {
    let mut config = load_from_env()?;
    if let Some(yaml) = yaml {
        apply_yaml(&mut config, yaml)?;
    }
    Ok(config)
}

fn apply_yaml(config: &mut ServerConfig, yaml: YamlConfig) -> ConfigResult<()> {
    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
    }

    if let Some(openai) = yaml.openai {
        if let Some(key) = openai.api_key {
            config.openai_api_key = key;
        }
        if let Some(url) = openai.base_url {
            config.openai_base_url = url;
        }
    }

    if let Some(chat) = yaml.chat {
        if let Some(mode) = chat.mode {
            config.chat_mode = parse_named("chat.mode", &mode, ChatMode::parse, CHAT_MODES)?;
        }
        if let Some(model) = chat.model {
            config.chat_model = model;
        }
        if let Some(prompt) = chat.system_prompt {
            config.system_prompt = prompt;
        }
        if chat.temperature.is_some() {
            config.chat_temperature = chat.temperature;
        }
        if chat.max_tokens.is_some() {
            config.chat_max_tokens = chat.max_tokens;
        }
    }

    if let Some(speech) = yaml.speech {
        if let Some(model) = speech.model {
            config.tts_model =
                parse_named("speech.model", &model, SpeechModel::parse, SPEECH_MODELS)?;
        }
        if let Some(voice) = speech.voice {
            config.tts_voice =
                parse_named("speech.voice", &voice, SpeechVoice::parse, SPEECH_VOICES)?;
        }
        if let Some(format) = speech.format {
            config.tts_format =
                parse_named("speech.format", &format, SpeechFormat::parse, SPEECH_FORMATS)?;
        }
        if let Some(instructions) = speech.instructions {
            config.tts_instructions = Some(instructions);
        }
        if let Some(speed) = speech.speed {
            config.tts_speed = speed;
        }
        if let Some(frame_size) = speech.frame_size {
            config.audio_frame_size = frame_size;
        }
    }

    if let Some(limits) = yaml.limits {
        if let Some(timeout) = limits.http_connect_timeout_seconds {
            config.http_connect_timeout_seconds = timeout;
        }
        if let Some(timeout) = limits.ws_idle_timeout_seconds {
            config.ws_idle_timeout_seconds = timeout;
        }
        if let Some(max_bytes) = limits.max_text_bytes {
            config.max_text_bytes = max_bytes;
        }
    }

    if let Some(security) = yaml.security
        && let Some(origins) = security.cors_allowed_origins
    {
        config.cors_allowed_origins = Some(origins);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_yaml_overrides_defaults() {
        let mut config = ServerConfig::default();
        let yaml = YamlConfig::from_yaml_str(
            r#"
server:
  port: 4000
openai:
  api_key: "sk-yaml"
chat:
  mode: "sdk"
  temperature: 0.5
speech:
  voice: "onyx"
  instructions: ""
"#,
        )
        .unwrap();

        apply_yaml(&mut config, yaml).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.openai_api_key, "sk-yaml");
        assert_eq!(config.chat_mode, ChatMode::Complete);
        assert_eq!(config.chat_temperature, Some(0.5));
        assert_eq!(config.tts_voice, SpeechVoice::Onyx);
        assert_eq!(config.speech_config().effective_instructions(), None);
    }

    #[test]
    fn test_absent_sections_leave_values_alone() {
        let mut config = ServerConfig::default();
        config.chat_temperature = Some(0.9);
        let yaml = YamlConfig::from_yaml_str("chat:\n  model: \"gpt-4o\"\n").unwrap();

        apply_yaml(&mut config, yaml).unwrap();

        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.chat_temperature, Some(0.9));
    }

    #[test]
    fn test_unknown_voice_in_yaml_is_rejected() {
        let mut config = ServerConfig::default();
        let yaml = YamlConfig::from_yaml_str("speech:\n  voice: \"robot\"\n").unwrap();

        let err = apply_yaml(&mut config, yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "speech.voice"));
    }
}
