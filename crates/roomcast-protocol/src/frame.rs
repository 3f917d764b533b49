//! Length-prefixed framing over a byte stream.
//!
//! ```text
//! ┌──────────────┬─────────────────────────────────┐
//! │ len: u32 LE  │ len bytes: one encoded Envelope │
//! └──────────────┴─────────────────────────────────┘
//! ```
//!
//! Reads from a stream land at arbitrary boundaries, so [`FrameDecoder`]
//! accumulates bytes and hands out complete frames one at a time, keeping
//! any partial trailing frame for the next read.

use bytes::{Buf, Bytes, BytesMut};

use crate::ProtocolError;

/// Size of the little-endian length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default upper bound on a single frame's payload (1 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

/// Prepends the 4-byte little-endian length to `payload`.
///
/// # Errors
/// Returns `ProtocolError::FrameTooLarge` if `payload` exceeds `max_len`.
pub fn encode_frame(
    payload: &[u8],
    max_len: usize,
) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > max_len || payload.len() > u32::MAX as usize {
        return Err(ProtocolError::FrameTooLarge {
            len: payload.len(),
            max: max_len,
        });
    }
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Incremental decoder that turns stream reads into whole frames.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    max_len: usize,
}

impl FrameDecoder {
    /// Creates a decoder that rejects frames longer than `max_len`.
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            max_len,
        }
    }

    /// Appends freshly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Extracts the next complete frame payload, if one is buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Call repeatedly until
    /// it does, so every frame from a single read is drained before the
    /// next one.
    ///
    /// # Errors
    /// Returns `ProtocolError::FrameTooLarge` as soon as a length prefix
    /// exceeds the limit, before any of its payload is buffered.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        if self.buf.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        prefix.copy_from_slice(&self.buf[..LENGTH_PREFIX_LEN]);
        let len = u32::from_le_bytes(prefix) as usize;

        if len > self.max_len {
            return Err(ProtocolError::FrameTooLarge {
                len,
                max: self.max_len,
            });
        }

        if self.buf.len() < LENGTH_PREFIX_LEN + len {
            self.buf.reserve(LENGTH_PREFIX_LEN + len - self.buf.len());
            return Ok(None);
        }

        self.buf.advance(LENGTH_PREFIX_LEN);
        Ok(Some(self.buf.split_to(len).freeze()))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}
