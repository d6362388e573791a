//! Configuration validation logic.

use url::Url;

use super::{ConfigError, ConfigResult};

/// Largest accepted audio frame
const MAX_FRAME_SIZE: usize = 1024 * 1024;

pub(super) fn validate_api_key(api_key: &str) -> ConfigResult<()> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::Missing("OPENAI_API_KEY"));
    }
    Ok(())
}

pub(super) fn validate_base_url(key: &str, url: &str) -> ConfigResult<()> {
    let invalid = |expected: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: url.to_string(),
        expected: expected.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&format!("a valid URL ({e})")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("an http:// or https:// URL"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("a URL with a host"));
    }
    Ok(())
}

pub(super) fn validate_chat_settings(
    model: &str,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
) -> ConfigResult<()> {
    if model.trim().is_empty() {
        return Err(ConfigError::Invalid("chat model must not be empty".to_string()));
    }
    if let Some(temperature) = temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(ConfigError::Invalid(format!(
            "chat temperature must be between 0 and 2, got {temperature}"
        )));
    }
    if max_tokens == Some(0) {
        return Err(ConfigError::Invalid(
            "chat max_tokens must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Speed outside 0.25..=4.0 is clamped later; only non-numbers are rejected.
pub(super) fn validate_speech_settings(speed: f32, frame_size: usize) -> ConfigResult<()> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "speech speed must be a positive number, got {speed}"
        )));
    }
    if frame_size == 0 || frame_size > MAX_FRAME_SIZE {
        return Err(ConfigError::Invalid(format!(
            "audio frame size must be between 1 and {MAX_FRAME_SIZE} bytes, got {frame_size}"
        )));
    }
    Ok(())
}

pub(super) fn validate_limits(
    connect_timeout_seconds: u64,
    idle_timeout_seconds: u64,
    max_text_bytes: usize,
) -> ConfigResult<()> {
    if connect_timeout_seconds == 0 {
        return Err(ConfigError::Invalid(
            "HTTP connect timeout must be at least 1 second".to_string(),
        ));
    }
    if idle_timeout_seconds == 0 {
        return Err(ConfigError::Invalid(
            "WebSocket idle timeout must be at least 1 second".to_string(),
        ));
    }
    if max_text_bytes == 0 {
        return Err(ConfigError::Invalid(
            "max text size must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
