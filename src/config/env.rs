//! Environment variable loading.

use std::str::FromStr;

use super::{ConfigError, ConfigResult, ServerConfig};
use crate::core::llm::ChatMode;
use crate::core::tts::{SpeechFormat, SpeechModel, SpeechVoice};

/// Read a variable, treating unset and blank the same.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn invalid(key: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

/// Parse a scalar setting.
pub(super) fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| invalid(key, value, expected))
}

/// Parse a setting with a fixed set of names.
pub(super) fn parse_named<T>(
    key: &str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
    expected: &str,
) -> ConfigResult<T> {
    parse(value).ok_or_else(|| invalid(key, value, expected))
}

pub(super) const CHAT_MODES: &str = "streaming, complete or sdk";
pub(super) const SPEECH_MODELS: &str = "tts-1, tts-1-hd or gpt-4o-mini-tts";
pub(super) const SPEECH_VOICES: &str =
    "alloy, ash, ballad, coral, echo, fable, onyx, nova, sage, shimmer or verse";
pub(super) const SPEECH_FORMATS: &str = "mp3, opus, aac, flac, wav or pcm";

/// Build a configuration from defaults overridden by environment variables.
pub(super) fn load_from_env() -> ConfigResult<ServerConfig> {
    let mut config = ServerConfig::default();

    if let Some(host) = env_var("HOST") {
        config.host = host;
    }
    if let Some(port) = env_var("PORT") {
        config.port = parse_value("PORT", &port, "a port number")?;
    }

    if let Some(key) = env_var("OPENAI_API_KEY") {
        config.openai_api_key = key;
    }
    if let Some(url) = env_var("OPENAI_BASE_URL") {
        config.openai_base_url = url;
    }

    if let Some(mode) = env_var("CHAT_MODE") {
        config.chat_mode = parse_named("CHAT_MODE", &mode, ChatMode::parse, CHAT_MODES)?;
    }
    if let Some(model) = env_var("CHAT_MODEL") {
        config.chat_model = model;
    }
    if let Some(prompt) = env_var("SYSTEM_PROMPT") {
        config.system_prompt = prompt;
    }
    if let Some(temperature) = env_var("CHAT_TEMPERATURE") {
        config.chat_temperature = Some(parse_value(
            "CHAT_TEMPERATURE",
            &temperature,
            "a number",
        )?);
    }
    if let Some(max_tokens) = env_var("CHAT_MAX_TOKENS") {
        config.chat_max_tokens = Some(parse_value(
            "CHAT_MAX_TOKENS",
            &max_tokens,
            "a positive integer",
        )?);
    }

    if let Some(model) = env_var("TTS_MODEL") {
        config.tts_model = parse_named("TTS_MODEL", &model, SpeechModel::parse, SPEECH_MODELS)?;
    }
    if let Some(voice) = env_var("TTS_VOICE") {
        config.tts_voice = parse_named("TTS_VOICE", &voice, SpeechVoice::parse, SPEECH_VOICES)?;
    }
    if let Some(format) = env_var("TTS_FORMAT") {
        config.tts_format =
            parse_named("TTS_FORMAT", &format, SpeechFormat::parse, SPEECH_FORMATS)?;
    }
    if let Some(instructions) = env_var("TTS_INSTRUCTIONS") {
        config.tts_instructions = Some(instructions);
    }
    if let Some(speed) = env_var("TTS_SPEED") {
        config.tts_speed = parse_value("TTS_SPEED", &speed, "a number")?;
    }
    if let Some(frame_size) = env_var("AUDIO_FRAME_SIZE") {
        config.audio_frame_size =
            parse_value("AUDIO_FRAME_SIZE", &frame_size, "a size in bytes")?;
    }

    if let Some(timeout) = env_var("HTTP_CONNECT_TIMEOUT_SECONDS") {
        config.http_connect_timeout_seconds =
            parse_value("HTTP_CONNECT_TIMEOUT_SECONDS", &timeout, "seconds")?;
    }
    if let Some(timeout) = env_var("WS_IDLE_TIMEOUT_SECONDS") {
        config.ws_idle_timeout_seconds =
            parse_value("WS_IDLE_TIMEOUT_SECONDS", &timeout, "seconds")?;
    }
    if let Some(max_bytes) = env_var("MAX_TEXT_BYTES") {
        config.max_text_bytes = parse_value("MAX_TEXT_BYTES", &max_bytes, "a size in bytes")?;
    }
    if let Some(origins) = env_var("CORS_ALLOWED_ORIGINS") {
        config.cors_allowed_origins = Some(origins);
    }

    Ok(config)
}
