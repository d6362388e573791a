//! Chat WebSocket handler
//!
//! Binds one WebSocket connection to one [`ConversationSession`]. Each
//! inbound text frame starts a turn; the turn's audio is forwarded as binary
//! frames while the socket keeps being read, so a close or an interrupt
//! takes effect without waiting for the reply to finish.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::{select, time::Duration};
use tracing::{debug, error, info, warn};

use crate::core::{
    AudioFrame, AudioStream, ConversationSession, PipelineError, PipelineResult, SessionState,
};
use crate::state::AppState;

use super::messages::{ChatMessageRoute, ClientMessage};

/// Channel buffer between the turn loop and the socket sender
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// How often an idle connection is checked
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Time the sender task gets to flush queued frames on shutdown
const SENDER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Chat WebSocket handler
///
/// Upgrades the HTTP connection to WebSocket. Utterance size is checked per
/// message against `max_text_bytes`; the transport limits only guard
/// against abusive frames.
pub async fn chat_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    debug!("Chat WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_chat_socket(socket, state))
}

/// Handle one chat connection from open to close
async fn handle_chat_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let session = app_state.open_session();
    let connection_id = session.id();
    info!(%connection_id, "Chat WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<ChatMessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing frames
    let mut sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let should_close = matches!(route, ChatMessageRoute::Close);

            let result = match route {
                ChatMessageRoute::Audio(data) => sender.send(Message::Binary(data)).await,
                ChatMessageRoute::Text(text) => sender.send(Message::Text(text.into())).await,
                ChatMessageRoute::Close => sender.send(Message::Close(None)).await,
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", transport_error(e));
                break;
            }

            if should_close {
                break;
            }
        }
    });

    let idle_timeout = app_state.config.idle_timeout();
    let idle_check = IDLE_CHECK_INTERVAL.min(idle_timeout);
    let max_text_bytes = app_state.config.max_text_bytes;

    let mut turn: Option<AudioStream> = None;
    let mut last_activity = Instant::now();

    loop {
        select! {
            msg_result = receiver.next() => {
                last_activity = Instant::now();

                match msg_result {
                    Some(Ok(msg)) => {
                        let continue_processing = process_client_message(
                            msg,
                            &session,
                            &mut turn,
                            &message_tx,
                            max_text_bytes,
                        ).await;

                        if !continue_processing {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        let error = transport_error(e);
                        warn!(%connection_id, "Chat WebSocket error: {}", error);
                        break;
                    }
                    None => {
                        info!(%connection_id, "Chat WebSocket connection closed by client");
                        break;
                    }
                }
            }
            frame = next_frame(&mut turn) => {
                last_activity = Instant::now();

                if !forward_frame(frame, &session, &mut turn, &message_tx).await {
                    break;
                }
            }
            _ = tokio::time::sleep(idle_check) => {
                if turn.is_none() && last_activity.elapsed() > idle_timeout {
                    warn!(
                        %connection_id,
                        "Chat WebSocket connection idle for {}s, closing",
                        last_activity.elapsed().as_secs()
                    );
                    let _ = message_tx.send(ChatMessageRoute::Close).await;
                    break;
                }
            }
        }
    }

    // Cleanup: abandon any in-flight turn and release the session
    if turn.take().is_some() {
        info!(%connection_id, "Abandoning in-flight turn on disconnect");
    }
    app_state.sessions.remove(&connection_id);

    drop(message_tx);
    if tokio::time::timeout(SENDER_DRAIN_TIMEOUT, &mut sender_task)
        .await
        .is_err()
    {
        sender_task.abort();
    }

    info!(%connection_id, "Chat WebSocket connection terminated");
}

/// Failure of the client connection itself.
fn transport_error(e: axum::Error) -> PipelineError {
    PipelineError::Transport(e.to_string())
}

/// Next item of the in-flight turn; never resolves when there is none.
async fn next_frame(turn: &mut Option<AudioStream>) -> Option<PipelineResult<AudioFrame>> {
    match turn {
        Some(audio) => audio.next().await,
        None => std::future::pending().await,
    }
}

/// Handle one item of the in-flight turn. Returns false to close the connection.
async fn forward_frame(
    frame: Option<PipelineResult<AudioFrame>>,
    session: &ConversationSession,
    turn: &mut Option<AudioStream>,
    message_tx: &mpsc::Sender<ChatMessageRoute>,
) -> bool {
    match frame {
        Some(Ok(data)) => {
            debug!(bytes = data.len(), "Forwarding audio frame");
            message_tx.send(ChatMessageRoute::Audio(data)).await.is_ok()
        }
        Some(Err(e)) => {
            *turn = None;
            error!(connection_id = %session.id(), "Turn failed: {}", e);
            if message_tx
                .send(ChatMessageRoute::error(e.user_message()))
                .await
                .is_err()
            {
                return false;
            }

            if session.state() == SessionState::Failed {
                info!(connection_id = %session.id(), "Session failed, closing connection");
                let _ = message_tx.send(ChatMessageRoute::Close).await;
                return false;
            }
            true
        }
        None => {
            *turn = None;
            message_tx.send(ChatMessageRoute::done()).await.is_ok()
        }
    }
}

/// Process one inbound WebSocket message. Returns false to close the connection.
async fn process_client_message(
    msg: Message,
    session: &ConversationSession,
    turn: &mut Option<AudioStream>,
    message_tx: &mpsc::Sender<ChatMessageRoute>,
    max_text_bytes: usize,
) -> bool {
    match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());

            match ClientMessage::parse(text.as_str(), max_text_bytes) {
                Ok(ClientMessage::Interrupt) => {
                    if turn.take().is_some() {
                        info!(connection_id = %session.id(), "Turn interrupted by client");
                    }
                    true
                }
                Ok(ClientMessage::Utterance(utterance)) => match session.respond(utterance) {
                    Ok(audio) => {
                        *turn = Some(audio);
                        true
                    }
                    Err(e) => {
                        warn!(connection_id = %session.id(), "Rejected utterance: {}", e);
                        message_tx
                            .send(ChatMessageRoute::error(e.user_message()))
                            .await
                            .is_ok()
                    }
                },
                Err(rejection) => {
                    warn!(connection_id = %session.id(), "Rejected utterance: {}", rejection);
                    message_tx
                        .send(ChatMessageRoute::error(rejection))
                        .await
                        .is_ok()
                }
            }
        }
        Message::Binary(data) => {
            debug!("Ignoring binary message: {} bytes", data.len());
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!(connection_id = %session.id(), "Chat WebSocket close frame received");
            false
        }
    }
}
