//! Length-prefixed framing for `tokio_util::codec`.
//!
//! The decoder validates the length field as soon as its 4 bytes are
//! buffered, before waiting for the rest of the packet, so a zero or
//! oversized length is reported without reading any body bytes.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::StreamError;
use crate::packet::{HEADER_LENGTH, LENGTH_FIELD_SIZE, MAX_FRAME_BYTES, Packet};

#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_frame_bytes: u32,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self {
            max_frame_bytes: MAX_FRAME_BYTES,
        }
    }

    /// Lower the body cap (never above [`MAX_FRAME_BYTES`]).
    pub fn with_max_frame_bytes(mut self, max: u32) -> Self {
        self.max_frame_bytes = max.min(MAX_FRAME_BYTES);
        self
    }

    pub fn max_frame_bytes(&self) -> u32 {
        self.max_frame_bytes
    }

    /// Append the zero-length End-Of-Stream sentinel.
    pub fn encode_end_of_stream(dst: &mut BytesMut) {
        dst.put_u32(0);
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = StreamError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_FIELD_SIZE {
            return Ok(None);
        }

        let body_length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        if body_length == 0 {
            src.advance(LENGTH_FIELD_SIZE);
            return Err(StreamError::EndOfStream);
        }
        if body_length > self.max_frame_bytes {
            return Err(StreamError::FrameTooLarge {
                size: body_length,
                max: self.max_frame_bytes,
            });
        }

        let total = HEADER_LENGTH + body_length as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_FIELD_SIZE);
        let rotation_raw = src.get_i32();
        let body = src.split_to(body_length as usize).freeze();

        Packet::new(rotation_raw, body).map(Some)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = StreamError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.body_length() > self.max_frame_bytes {
            return Err(StreamError::FrameTooLarge {
                size: item.body_length(),
                max: self.max_frame_bytes,
            });
        }

        dst.reserve(item.wire_len());
        dst.put_u32(item.body_length());
        dst.put_i32(item.rotation_raw());
        dst.extend_from_slice(item.body());
        Ok(())
    }
}
