//! Compressed-image decoding.
//!
//! The pipeline depends only on the [`FrameCodec`] contract: bytes in,
//! RGB pixels out, no state carried between calls.

use image::RgbImage;

use crate::error::StreamError;

/// Decodes one compressed image body into RGB8 pixels.
pub trait FrameCodec: Send {
    fn decode(&self, body: &[u8]) -> Result<RgbImage, StreamError>;
}

/// Format-sniffing decoder backed by the `image` crate (JPEG, PNG, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl FrameCodec for ImageCodec {
    fn decode(&self, body: &[u8]) -> Result<RgbImage, StreamError> {
        if body.is_empty() {
            return Err(StreamError::Decode("empty body".into()));
        }
        let rgb = image::load_from_memory(body)?.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(StreamError::Decode(format!(
                "degenerate image {}x{}",
                rgb.width(),
                rgb.height()
            )));
        }
        Ok(rgb)
    }
}
