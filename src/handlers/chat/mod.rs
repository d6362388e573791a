//! Conversation WebSocket
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - **Text frame**: one utterance to answer
//! - **`__interrupt__`**: abandon the reply in progress (no sentinel follows)
//! - **Binary frames**: ignored
//!
//! ## Server → Client
//!
//! - **Binary frames**: raw audio of the reply, in order
//! - **`__done__`**: the reply finished; sent after its last audio frame
//! - **`Error: <description>`**: the turn failed or the utterance was rejected
//!
//! A failed turn never ends with `__done__`. When the session cannot recover
//! the error frame is followed by a close.

mod handler;
pub mod messages;

pub use handler::chat_handler;
pub use messages::{
    ChatMessageRoute, ClientMessage, DONE_SENTINEL, ERROR_PREFIX, INTERRUPT_COMMAND,
    InboundRejection,
};
