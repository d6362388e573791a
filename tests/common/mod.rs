//! Shared helpers for the integration tests.
//!
//! The OpenAI API is replaced by a wiremock server; the gateway runs on an
//! ephemeral port and is driven by a tokio-tungstenite client.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voice_chat_gateway::{AppState, ServerConfig, core::ChatMode, routes};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TEST_API_KEY: &str = "sk-test";
pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const SPEECH_PATH: &str = "/v1/audio/speech";

/// Gateway configuration pointing at the mock OpenAI server.
pub fn test_config(server: &MockServer, mode: ChatMode, frame_size: usize) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.openai_api_key = TEST_API_KEY.to_string();
    config.openai_base_url = format!("{}/v1", server.uri());
    config.chat_mode = mode;
    config.audio_frame_size = frame_size;
    config
}

// =============================================================================
// OpenAI mocks
// =============================================================================

/// SSE body with one chunk per fragment, optionally closed by `[DONE]`.
pub fn sse_body(fragments: &[&str], finished: bool) -> String {
    let mut body = String::new();
    body.push_str(
        "data: {\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
    );
    for fragment in fragments {
        let chunk = json!({
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": fragment}, "finish_reason": null}],
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    if finished {
        body.push_str("data: {\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n");
        body.push_str("data: [DONE]\n\n");
    }
    body
}

pub async fn mount_chat_stream(server: &MockServer, fragments: &[&str], finished: bool) {
    mount_chat_stream_delayed(server, fragments, finished, Duration::ZERO).await;
}

pub async fn mount_chat_stream_delayed(
    server: &MockServer,
    fragments: &[&str],
    finished: bool,
    delay: Duration,
) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(fragments, finished), "text/event-stream")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

pub async fn mount_chat_complete(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })))
        .mount(server)
        .await;
}

pub async fn mount_speech(server: &MockServer, audio: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path(SPEECH_PATH))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(audio, "application/octet-stream"))
        .mount(server)
        .await;
}

pub async fn mount_speech_error(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(SPEECH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// JSON bodies of every request the mock received on `request_path`.
pub async fn request_bodies(server: &MockServer, request_path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == request_path)
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

// =============================================================================
// Gateway
// =============================================================================

/// Serve the gateway on an ephemeral port.
pub async fn spawn_gateway(state: Arc<AppState>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::create_app(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

pub async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/chat")).await.unwrap();
    ws
}

/// Everything the gateway sent for one turn.
#[derive(Debug)]
pub struct Reply {
    pub frames: Vec<Vec<u8>>,
    /// `__done__` or an `Error: ...` text
    pub terminal: String,
}

impl Reply {
    pub fn audio(&self) -> Vec<u8> {
        self.frames.concat()
    }
}

/// Read binary frames until the first text frame.
pub async fn read_reply(ws: &mut WsClient) -> Reply {
    let mut frames = Vec::new();
    loop {
        let message = tokio::time::timeout(Duration::from_secs(10), ws.next())
            .await
            .expect("timed out waiting for the gateway")
            .expect("connection closed before the reply ended")
            .expect("WebSocket error");
        match message {
            Message::Binary(data) => frames.push(data.to_vec()),
            Message::Text(text) => {
                return Reply {
                    frames,
                    terminal: text.to_string(),
                };
            }
            Message::Close(_) => panic!("connection closed before the reply ended"),
            _ => {}
        }
    }
}

/// Assert that nothing arrives for `quiet`.
pub async fn expect_silence(ws: &mut WsClient, quiet: Duration) {
    if let Ok(message) = tokio::time::timeout(quiet, ws.next()).await {
        panic!("Unexpected message from gateway: {message:?}");
    }
}

/// Wait until the registry no longer holds any session.
pub async fn wait_for_empty_registry(state: &AppState) {
    for _ in 0..50 {
        if state.sessions.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("sessions still registered: {:?}", state.sessions.ids());
}
