//! Incrementally encoded request body for `/audio/speech`.
//!
//! The body is a single JSON object whose `input` string is not known up
//! front. It is emitted in three parts:
//!
//! ```text
//! {"instructions":"…","model":"…","response_format":"pcm","voice":"coral","input":"
//! <fragment 1, JSON-escaped><fragment 2, JSON-escaped>…
//! "}
//! ```
//!
//! so the first bytes go on the wire as soon as the first fragment exists.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::config::SpeechConfig;
use crate::core::base::{FragmentStream, PipelineError};

/// Closes the `input` string and the JSON object
const BODY_SUFFIX: &[u8] = b"\"}";

/// Records why the body stream stopped early.
///
/// The HTTP client only sees an opaque I/O error when a body stream fails,
/// so the real cause is parked here for the caller.
pub(crate) type UpstreamError = Arc<Mutex<Option<PipelineError>>>;

/// Builder for the streamed synthesis request body.
#[derive(Debug, Clone)]
pub struct SpeechRequestBody {
    preamble: Bytes,
}

impl SpeechRequestBody {
    pub fn new(config: &SpeechConfig) -> Self {
        let mut fields = json!({
            "model": config.model.as_str(),
            "voice": config.voice.as_str(),
            "response_format": config.format.as_str(),
        });
        if let Some(instructions) = config.effective_instructions() {
            fields["instructions"] = json!(instructions);
        }
        if let Some(speed) = config.effective_speed() {
            fields["speed"] = json!(speed);
        }

        // Reopen the serialized object and start the input string
        let mut preamble = fields.to_string();
        preamble.pop();
        preamble.push_str(",\"input\":\"");

        Self {
            preamble: Bytes::from(preamble),
        }
    }

    /// Everything before the first fragment.
    pub fn preamble(&self) -> &Bytes {
        &self.preamble
    }

    /// JSON-escape one fragment for placement inside the `input` string.
    pub fn encode_fragment(fragment: &str) -> Bytes {
        let quoted = Value::String(fragment.to_owned()).to_string();
        Bytes::copy_from_slice(quoted[1..quoted.len() - 1].as_bytes())
    }

    /// Turn a fragment sequence into body chunks.
    ///
    /// A failing fragment sequence stores its error in `upstream` and ends the
    /// body with an I/O error, which aborts the request mid-flight.
    pub(crate) fn into_stream(
        self,
        mut fragments: FragmentStream,
        upstream: UpstreamError,
    ) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        async_stream::stream! {
            yield Ok(self.preamble);

            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(text) => yield Ok(Self::encode_fragment(&text)),
                    Err(e) => {
                        let message = e.to_string();
                        *upstream.lock() = Some(e);
                        yield Err(io::Error::other(message));
                        return;
                    }
                }
            }

            yield Ok(Bytes::from_static(BODY_SUFFIX));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::base::PipelineResult;
    use crate::core::tts::config::SpeechModel;
    use futures::stream;

    fn fragments(items: Vec<PipelineResult<&str>>) -> FragmentStream {
        stream::iter(
            items
                .into_iter()
                .map(|item| item.map(str::to_string))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    async fn collect_body(body: SpeechRequestBody, input: FragmentStream) -> Vec<u8> {
        let upstream = UpstreamError::default();
        let chunks: Vec<io::Result<Bytes>> = body.into_stream(input, upstream).collect().await;
        chunks
            .into_iter()
            .flat_map(|chunk| chunk.unwrap().to_vec())
            .collect()
    }

    #[tokio::test]
    async fn test_body_is_valid_json_with_escaped_input() {
        let body = SpeechRequestBody::new(&SpeechConfig::default());
        let input = fragments(vec![
            Ok("She said \"hi\""),
            Ok("\nthen left\\"),
            Ok(" \u{1} ok"),
        ]);

        let bytes = collect_body(body, input).await;
        let json: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["input"], "She said \"hi\"\nthen left\\ \u{1} ok");
        assert_eq!(json["model"], "gpt-4o-mini-tts");
        assert_eq!(json["voice"], "coral");
        assert_eq!(json["response_format"], "pcm");
        assert_eq!(json["instructions"], "Speak in a cheerful and positive tone.");
        assert!(json.get("speed").is_none());
    }

    #[tokio::test]
    async fn test_empty_input_still_valid_json() {
        let body = SpeechRequestBody::new(&SpeechConfig::default());
        let bytes = collect_body(body, fragments(vec![])).await;
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["input"], "");
    }

    #[test]
    fn test_preamble_respects_model_and_speed() {
        let config = SpeechConfig {
            model: SpeechModel::Tts1,
            speed: 2.0,
            ..Default::default()
        };
        let preamble = SpeechRequestBody::new(&config).preamble().clone();
        let text = std::str::from_utf8(&preamble).unwrap();
        assert!(text.starts_with('{'));
        assert!(text.ends_with(",\"input\":\""));
        assert!(text.contains("\"speed\":2.0"));
        assert!(!text.contains("instructions"));
    }

    #[tokio::test]
    async fn test_failing_fragments_record_upstream_error() {
        let body = SpeechRequestBody::new(&SpeechConfig::default());
        let upstream = UpstreamError::default();
        let input = fragments(vec![
            Ok("Partial"),
            Err(PipelineError::Generation("stream cut".to_string())),
            Ok("never sent"),
        ]);

        let chunks: Vec<io::Result<Bytes>> =
            body.into_stream(input, upstream.clone()).collect().await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].as_ref().unwrap(), &Bytes::from_static(b"Partial"));
        assert!(chunks[2].is_err());
        assert_eq!(
            upstream.lock().clone(),
            Some(PipelineError::Generation("stream cut".to_string()))
        );
    }
}
