//! OpenAI chat completion client implementing [`TextGenerator`].
//!
//! # Architecture
//!
//! Every call sends the whole transcript; the remote service keeps no state.
//!
//! - **Streaming mode** reads the response as Server-Sent Events. Each event
//!   carries one `chat.completion.chunk`; its content delta is yielded as a
//!   fragment. The stream succeeds only on `data: [DONE]`; a body that ends
//!   without the marker is reported as a failure.
//! - **Complete mode** waits for the whole reply and yields it as a single
//!   fragment.
//!
//! Nothing is retried here. A failed call fails the turn.

use std::sync::Arc;

use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use tracing::{debug, error, warn};

use super::config::{ChatConfig, ChatMode};
use super::messages::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, STREAM_DONE_MARKER,
    describe_error_body,
};
use crate::core::base::{
    FragmentStream, PipelineError, PipelineResult, TextFragment, TextGenerator, single_fragment,
};
use crate::core::transcript::Turn;

/// Chat completion client for OpenAI-compatible endpoints.
///
/// One instance serves every session; the HTTP client is pooled.
#[derive(Clone)]
pub struct OpenAIChat {
    http: Client,
    config: Arc<ChatConfig>,
}

impl OpenAIChat {
    pub fn new(config: ChatConfig, http: Client) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn mode(&self) -> ChatMode {
        self.config.mode
    }
}

impl TextGenerator for OpenAIChat {
    fn generate(&self, turns: Vec<Turn>) -> FragmentStream {
        match self.config.mode {
            ChatMode::Streaming => {
                streamed_reply(self.http.clone(), self.config.clone(), turns).boxed()
            }
            ChatMode::Complete => {
                complete_reply(self.http.clone(), self.config.clone(), turns).boxed()
            }
        }
    }
}

// =============================================================================
// Request
// =============================================================================

async fn send_completion_request(
    http: &Client,
    config: &ChatConfig,
    turns: &[Turn],
    stream: bool,
) -> PipelineResult<Response> {
    let request = ChatCompletionRequest {
        model: &config.model,
        messages: turns,
        stream,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    debug!(
        model = %config.model,
        turns = turns.len(),
        stream,
        "Sending chat completion request"
    );

    let response = http
        .post(config.completions_url())
        .header("Authorization", format!("Bearer {}", config.api_key))
        .json(&request)
        .send()
        .await
        .map_err(|e| PipelineError::Generation(format!("Request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = describe_error_body(status.as_u16(), &body);
        error!(status = status.as_u16(), "Chat completion rejected: {}", message);
        return Err(PipelineError::Generation(message));
    }

    Ok(response)
}

// =============================================================================
// Streaming Mode
// =============================================================================

/// Outcome of one SSE `data:` payload.
#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    Fragment(TextFragment),
    Skip,
    Done,
}

fn parse_stream_event(data: &str) -> PipelineResult<StreamEvent> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(StreamEvent::Skip);
    }
    if data == STREAM_DONE_MARKER {
        return Ok(StreamEvent::Done);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(data).map_err(|e| {
        PipelineError::Generation(format!("Malformed stream event: {e}, data: {data}"))
    })?;

    if let Some(api_error) = chunk.error {
        return Err(PipelineError::Generation(format!(
            "OpenAI stream error: {api_error}"
        )));
    }

    Ok(match chunk.content() {
        Some(content) => StreamEvent::Fragment(content.to_string()),
        None => StreamEvent::Skip,
    })
}

fn streamed_reply(
    http: Client,
    config: Arc<ChatConfig>,
    turns: Vec<Turn>,
) -> impl Stream<Item = PipelineResult<TextFragment>> + Send + 'static {
    try_stream! {
        let response = send_completion_request(&http, &config, &turns, true).await?;
        let mut events = response.bytes_stream().eventsource();
        let mut fragment_count = 0usize;

        loop {
            let event = events
                .next()
                .await
                .ok_or_else(|| {
                    warn!(fragment_count, "Chat stream closed before [DONE]");
                    PipelineError::Generation(
                        "Stream closed before the reply completed".to_string(),
                    )
                })?
                .map_err(|e| PipelineError::Generation(format!("SSE stream error: {e}")))?;

            match parse_stream_event(&event.data)? {
                StreamEvent::Fragment(fragment) => {
                    fragment_count += 1;
                    yield fragment;
                }
                StreamEvent::Skip => {}
                StreamEvent::Done => {
                    debug!(fragment_count, "Chat stream completed");
                    break;
                }
            }
        }
    }
}

// =============================================================================
// Complete Mode
// =============================================================================

fn complete_reply(
    http: Client,
    config: Arc<ChatConfig>,
    turns: Vec<Turn>,
) -> impl Stream<Item = PipelineResult<TextFragment>> + Send + 'static {
    try_stream! {
        let response = send_completion_request(&http, &config, &turns, false).await?;
        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            PipelineError::Generation(format!("Malformed completion response: {e}"))
        })?;
        let content = completion
            .content()
            .ok_or_else(|| {
                PipelineError::Generation("Completion response has no content".to_string())
            })?
            .to_string();

        debug!(chars = content.len(), "Chat completion received");

        let mut fragments = single_fragment(content);
        while let Some(fragment) = fragments.next().await {
            yield fragment?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_content_event() {
        let event = parse_stream_event(
            r#"{"object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":" there"}}]}"#,
        )
        .unwrap();
        assert_eq!(event, StreamEvent::Fragment(" there".to_string()));
    }

    #[test]
    fn test_parse_done_marker() {
        assert_eq!(parse_stream_event("[DONE]").unwrap(), StreamEvent::Done);
        assert_eq!(parse_stream_event(" [DONE]\n").unwrap(), StreamEvent::Done);
    }

    #[test]
    fn test_parse_skips_empty_and_role_only_events() {
        assert_eq!(parse_stream_event("").unwrap(), StreamEvent::Skip);
        assert_eq!(
            parse_stream_event(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            StreamEvent::Skip
        );
        assert_eq!(parse_stream_event(r#"{"choices":[]}"#).unwrap(), StreamEvent::Skip);
    }

    #[test]
    fn test_parse_malformed_event_fails() {
        let result = parse_stream_event("{not json");
        assert!(matches!(result, Err(PipelineError::Generation(_))));
    }

    #[test]
    fn test_parse_error_event_fails() {
        let result = parse_stream_event(r#"{"error":{"message":"overloaded"}}"#);
        match result {
            Err(PipelineError::Generation(message)) => assert!(message.contains("overloaded")),
            other => panic!("Expected generation error, got {other:?}"),
        }
    }

    fn mock_chat(server: &MockServer, mode: ChatMode) -> OpenAIChat {
        OpenAIChat::new(
            ChatConfig {
                api_key: "sk-test".to_string(),
                base_url: format!("{}/v1", server.uri()),
                mode,
                ..Default::default()
            },
            Client::new(),
        )
    }

    fn sse(events: &[&str]) -> String {
        events.iter().map(|data| format!("data: {data}\n\n")).collect()
    }

    #[tokio::test]
    async fn test_streamed_reply_yields_deltas_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                sse(&[
                    r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#,
                    r#"{"choices":[{"delta":{"content":"Hi"}}]}"#,
                    r#"{"choices":[{"delta":{"content":" there"}}]}"#,
                    r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
                    "[DONE]",
                ]),
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let fragments: Vec<String> = mock_chat(&server, ChatMode::Streaming)
            .generate(vec![Turn::system("Be brief."), Turn::user("hello")])
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["Hi".to_string(), " there".to_string()]);
    }

    #[tokio::test]
    async fn test_streamed_reply_without_done_marker_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                sse(&[r#"{"choices":[{"delta":{"content":"Partial"}}]}"#]),
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let mut stream = mock_chat(&server, ChatMode::Streaming).generate(vec![Turn::user("hi")]);

        assert_eq!(stream.next().await, Some(Ok("Partial".to_string())));
        assert!(matches!(
            stream.next().await,
            Some(Err(PipelineError::Generation(_)))
        ));
    }

    #[tokio::test]
    async fn test_error_status_becomes_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached", "type": "requests"}
            })))
            .mount(&server)
            .await;

        let result: PipelineResult<Vec<String>> = mock_chat(&server, ChatMode::Streaming)
            .generate(vec![Turn::user("hi")])
            .try_collect()
            .await;

        match result {
            Err(PipelineError::Generation(message)) => {
                assert!(message.contains("429"));
                assert!(message.contains("Rate limit reached"));
            }
            other => panic!("Expected generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_reply_is_single_fragment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello there!"}}]
            })))
            .mount(&server)
            .await;

        let fragments: Vec<String> = mock_chat(&server, ChatMode::Complete)
            .generate(vec![Turn::user("hi")])
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["Hello there!".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let chat = OpenAIChat::new(
            ChatConfig {
                api_key: "sk-test".to_string(),
                base_url: "http://127.0.0.1:1/v1".to_string(),
                mode: ChatMode::Complete,
                ..Default::default()
            },
            Client::new(),
        );

        let result: PipelineResult<Vec<String>> =
            chat.generate(vec![Turn::user("hi")]).try_collect().await;
        assert!(matches!(result, Err(PipelineError::Generation(_))));
    }

    #[test]
    fn test_generator_keeps_configured_mode() {
        let chat = OpenAIChat::new(
            ChatConfig {
                mode: ChatMode::Streaming,
                ..Default::default()
            },
            Client::new(),
        );
        assert_eq!(chat.mode(), ChatMode::Streaming);
        assert_eq!(chat.config().model, "gpt-4o-mini");
    }
}
