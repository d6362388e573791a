//! Re-chunking of synthesized audio into fixed-size frames.

use bytes::{Bytes, BytesMut};

use crate::core::base::AudioFrame;

/// Splits an arbitrary byte stream into frames of exactly `frame_size` bytes.
///
/// Whatever is left when the stream ends is released by [`finish`](Self::finish)
/// as one shorter frame. Dropping the chunker discards buffered bytes.
#[derive(Debug)]
pub struct FrameChunker {
    frame_size: usize,
    buffer: BytesMut,
}

impl FrameChunker {
    /// Create a chunker. A zero frame size is treated as one byte.
    pub fn new(frame_size: usize) -> Self {
        let frame_size = frame_size.max(1);
        Self {
            frame_size,
            buffer: BytesMut::with_capacity(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Bytes waiting for a full frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed bytes and take every frame that is now complete.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<AudioFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::with_capacity(self.buffer.len() / self.frame_size);
        while self.buffer.len() >= self.frame_size {
            frames.push(self.buffer.split_to(self.frame_size).freeze());
        }
        frames
    }

    /// Release the trailing partial frame, if any.
    pub fn finish(&mut self) -> Option<AudioFrame> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.split().freeze())
        }
    }
}
