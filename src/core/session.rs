//! Conversation session: one transcript and the turn state machine.
//!
//! ```text
//! Idle ──respond──▶ Generating ──synthesizer started──▶ Synthesizing ──drained──▶ Idle
//!                        │                                   │
//!                        │ generation error / dropped         │ synthesis error
//!                        ▼                                   ▼
//!                       Idle                               Failed (terminal)
//! ```
//!
//! The user turn is appended when a turn starts and is never rolled back.
//! The assistant turn is appended only after the whole reply was generated
//! and its audio fully drained by the caller.

use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::base::{
    AudioFrame, AudioStream, FragmentStream, PipelineError, PipelineResult, SpeechSynthesizer,
    TextGenerator,
};
use super::transcript::{Transcript, Turn};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Ready for a new turn
    Idle,
    /// Waiting on the text generator
    Generating,
    /// Text is being fed to the synthesizer and audio is flowing back
    Synthesizing,
    /// A synthesis failure left the session unusable
    Failed,
}

impl SessionState {
    #[inline]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Generating | Self::Synthesizing)
    }
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    transcript: Transcript,
}

type SharedInner = Arc<Mutex<SessionInner>>;

/// One dialogue bound to one client connection.
pub struct ConversationSession {
    id: Uuid,
    inner: SharedInner,
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl ConversationSession {
    pub fn new(
        id: Uuid,
        system_prompt: impl Into<String>,
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            id,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Idle,
                transcript: Transcript::new(system_prompt),
            })),
            generator,
            synthesizer,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Transcript {
        self.inner.lock().transcript.clone()
    }

    /// Start a turn for `text` and return its audio.
    ///
    /// Fails immediately with [`PipelineError::SessionBusy`] while another
    /// turn is in flight, and with [`PipelineError::SessionFailed`] once the
    /// session is terminal. Otherwise the user turn is recorded and a lazy
    /// stream is returned; nothing is sent upstream until it is polled.
    ///
    /// Dropping the stream before it ends abandons the turn: both remote
    /// calls are cancelled, the partial reply is discarded and the session
    /// returns to [`SessionState::Idle`].
    pub fn respond(&self, text: impl Into<String>) -> PipelineResult<AudioStream> {
        let turns = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Generating | SessionState::Synthesizing => {
                    return Err(PipelineError::SessionBusy);
                }
                SessionState::Failed => return Err(PipelineError::SessionFailed),
                SessionState::Idle => {}
            }
            inner.transcript.push(Turn::user(text));
            inner.state = SessionState::Generating;
            inner.transcript.turns().to_vec()
        };

        debug!(session_id = %self.id, turns = turns.len(), "Starting turn");

        let guard = TurnGuard {
            session_id: self.id,
            inner: self.inner.clone(),
            finished: false,
        };
        Ok(run_turn(
            guard,
            self.generator.clone(),
            self.synthesizer.clone(),
            turns,
        )
        .boxed())
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// Turn Execution
// =============================================================================

/// Owns the in-flight turn's claim on the session state.
struct TurnGuard {
    session_id: Uuid,
    inner: SharedInner,
    finished: bool,
}

impl TurnGuard {
    fn set_state(&self, state: SessionState) {
        self.inner.lock().state = state;
    }

    fn commit(&mut self, reply: String) {
        let mut inner = self.inner.lock();
        inner.transcript.push(Turn::assistant(reply));
        inner.state = SessionState::Idle;
        self.finished = true;
    }

    /// Settle the state for a failed turn and hand the error back.
    fn fail(&mut self, error: PipelineError) -> PipelineError {
        let next = match error {
            PipelineError::Synthesis { .. } => SessionState::Failed,
            _ => SessionState::Idle,
        };
        self.set_state(next);
        self.finished = true;
        warn!(
            session_id = %self.session_id,
            state = ?next,
            "Turn failed: {}", error
        );
        error
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.set_state(SessionState::Idle);
            debug!(session_id = %self.session_id, "Turn abandoned before completion");
        }
    }
}

#[derive(Debug, Default)]
struct ReplyState {
    text: String,
    complete: bool,
}

/// Collects the fragments that pass through on their way to the synthesizer.
#[derive(Debug, Clone, Default)]
struct ReplyAccumulator {
    state: Arc<Mutex<ReplyState>>,
}

impl ReplyAccumulator {
    fn track(&self, mut fragments: FragmentStream) -> FragmentStream {
        let state = self.state.clone();
        async_stream::stream! {
            while let Some(fragment) = fragments.next().await {
                let failed = match &fragment {
                    Ok(text) => {
                        state.lock().text.push_str(text);
                        false
                    }
                    Err(_) => true,
                };
                yield fragment;
                if failed {
                    return;
                }
            }
            state.lock().complete = true;
        }
        .boxed()
    }

    /// The full reply, if the generator reached its end.
    fn finish(&self) -> Option<String> {
        let mut state = self.state.lock();
        state.complete.then(|| std::mem::take(&mut state.text))
    }
}

fn run_turn(
    mut guard: TurnGuard,
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    turns: Vec<Turn>,
) -> impl Stream<Item = PipelineResult<AudioFrame>> + Send + 'static {
    try_stream! {
        let reply = ReplyAccumulator::default();
        let fragments = reply.track(generator.generate(turns));

        let mut audio = synthesizer.synthesize(fragments);
        guard.set_state(SessionState::Synthesizing);

        let mut frame_count = 0usize;
        while let Some(frame) = audio.next().await {
            let frame = frame.map_err(|e| guard.fail(e))?;
            frame_count += 1;
            yield frame;
        }

        let text = reply.finish().ok_or_else(|| {
            guard.fail(PipelineError::Generation(
                "Reply ended before generation completed".to_string(),
            ))
        })?;

        info!(
            session_id = %guard.session_id,
            frames = frame_count,
            chars = text.len(),
            "Turn completed"
        );
        guard.commit(text);
    }
}
