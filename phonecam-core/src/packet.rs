//! One protocol unit: a compressed image plus its rotation hint.
//!
//! ## Wire format (big-endian)
//!
//! ```text
//! body_length:  u32  (4)   1..=MAX_FRAME_BYTES, 0 = End-Of-Stream
//! rotation_raw: i32  (4)   any value, normalised mod 360
//! body:         [u8] (body_length)
//! ```

use bytes::Bytes;

use crate::error::StreamError;
use crate::frame::types::{Rotation, normalize_degrees};

/// Upper bound on a single compressed frame body.
pub const MAX_FRAME_BYTES: u32 = 20_000_000;

/// Size of the `body_length` field.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Size of the `rotation_raw` field.
pub const ROTATION_FIELD_SIZE: usize = 4;

/// Both fixed-width header fields.
pub const HEADER_LENGTH: usize = LENGTH_FIELD_SIZE + ROTATION_FIELD_SIZE;

/// A fully received packet. Partial reads never produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    rotation_raw: i32,
    body: Bytes,
}

impl Packet {
    /// Build a packet, enforcing `1..=MAX_FRAME_BYTES` on the body.
    pub fn new(rotation_raw: i32, body: impl Into<Bytes>) -> Result<Self, StreamError> {
        let body = body.into();
        if body.is_empty() {
            return Err(StreamError::ProtocolViolation(
                "empty body is reserved for end of stream",
            ));
        }
        if body.len() > MAX_FRAME_BYTES as usize {
            return Err(StreamError::FrameTooLarge {
                size: u32::try_from(body.len()).unwrap_or(u32::MAX),
                max: MAX_FRAME_BYTES,
            });
        }
        Ok(Self { rotation_raw, body })
    }

    pub fn rotation_raw(&self) -> i32 {
        self.rotation_raw
    }

    /// Rotation normalised into `[0, 360)`.
    pub fn rotation_degrees(&self) -> u32 {
        normalize_degrees(self.rotation_raw)
    }

    pub fn rotation(&self) -> Rotation {
        Rotation::from_raw(self.rotation_raw)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// `body_length` as it appears on the wire.
    pub fn body_length(&self) -> u32 {
        // Bounded by MAX_FRAME_BYTES at construction.
        self.body.len() as u32
    }

    /// Header plus body size on the wire.
    pub fn wire_len(&self) -> usize {
        HEADER_LENGTH + self.body.len()
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}
