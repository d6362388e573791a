//! OpenAI speech synthesizer fed by a live fragment stream.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base_url}/audio/speech`
//! - Models: tts-1, tts-1-hd, gpt-4o-mini-tts
//! - Output: raw bytes in the requested `response_format`
//!
//! One request is made per reply. Its body is produced by
//! [`SpeechRequestBody`] while the fragments are still being generated, and
//! the response body is re-chunked by [`FrameChunker`].

use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use reqwest::{Body, Client, Response};
use tracing::{debug, error};

use super::body::{SpeechRequestBody, UpstreamError};
use super::config::SpeechConfig;
use super::framing::FrameChunker;
use crate::core::base::{
    AudioFrame, AudioStream, FragmentStream, PipelineError, PipelineResult, SpeechSynthesizer,
};

#[derive(Clone)]
pub struct OpenAISpeech {
    http: Client,
    config: Arc<SpeechConfig>,
    body: SpeechRequestBody,
}

impl OpenAISpeech {
    pub fn new(config: SpeechConfig, http: Client) -> Self {
        let body = SpeechRequestBody::new(&config);
        Self {
            http,
            config: Arc::new(config),
            body,
        }
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }
}

impl SpeechSynthesizer for OpenAISpeech {
    fn synthesize(&self, fragments: FragmentStream) -> AudioStream {
        synthesize_frames(
            self.http.clone(),
            self.config.clone(),
            self.body.clone(),
            fragments,
        )
        .boxed()
    }
}

/// Prefer the recorded upstream failure over the error the sink observed.
fn upstream_or(upstream: &UpstreamError, fallback: PipelineError) -> PipelineError {
    upstream.lock().take().unwrap_or(fallback)
}

fn check_upstream(upstream: &UpstreamError) -> PipelineResult<()> {
    match upstream.lock().take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn check_status(response: Response, upstream: &UpstreamError) -> PipelineResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    check_upstream(upstream)?;
    error!(status = status.as_u16(), "Speech synthesis rejected: {}", body);
    Err(PipelineError::Synthesis {
        status: Some(status.as_u16()),
        body,
    })
}

fn synthesize_frames(
    http: Client,
    config: Arc<SpeechConfig>,
    body: SpeechRequestBody,
    fragments: FragmentStream,
) -> impl Stream<Item = PipelineResult<AudioFrame>> + Send + 'static {
    try_stream! {
        let upstream = UpstreamError::default();
        let request_body = Body::wrap_stream(body.into_stream(fragments, upstream.clone()));

        debug!(
            model = %config.model,
            voice = %config.voice,
            format = %config.format,
            "Sending streamed speech request"
        );

        let response = http
            .post(config.speech_url())
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("Content-Type", "application/json")
            .body(request_body)
            .send()
            .await
            .map_err(|e| {
                upstream_or(
                    &upstream,
                    PipelineError::Synthesis {
                        status: None,
                        body: format!("Request failed: {e}"),
                    },
                )
            })?;

        let response = check_status(response, &upstream).await?;
        let status = response.status().as_u16();

        let mut chunker = FrameChunker::new(config.frame_size);
        let mut audio = response.bytes_stream();
        let mut frame_count = 0usize;
        let mut byte_count = 0usize;

        while let Some(chunk) = audio.next().await {
            let chunk = chunk.map_err(|e| {
                upstream_or(
                    &upstream,
                    PipelineError::Synthesis {
                        status: Some(status),
                        body: format!("Audio stream interrupted: {e}"),
                    },
                )
            })?;
            for frame in chunker.push(&chunk) {
                frame_count += 1;
                byte_count += frame.len();
                yield frame;
            }
        }

        check_upstream(&upstream)?;
        if let Some(frame) = chunker.finish() {
            frame_count += 1;
            byte_count += frame.len();
            yield frame;
        }

        debug!(frame_count, byte_count, "Speech synthesis completed");
    }
}
