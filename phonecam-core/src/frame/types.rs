//! Shared types for the decode → rotate → composite pipeline.
//!
//! These are in-memory frame representations used between pipeline
//! stages. They are distinct from [`crate::packet::Packet`], which is
//! the compressed unit carried on the wire.

use std::time::Instant;

use image::RgbImage;
use serde::{Deserialize, Serialize};

// ── Rotation ─────────────────────────────────────────────────────

/// Normalise a raw wire rotation into `[0, 360)`.
///
/// Equivalent to `((raw % 360) + 360) % 360`.
pub const fn normalize_degrees(raw: i32) -> u32 {
    raw.rem_euclid(360) as u32
}

/// Orientation correction applied to a decoded frame.
///
/// Only quarter turns are meaningful; any other normalised angle maps
/// to [`Rotation::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    None,
    /// One quarter turn clockwise.
    Clockwise90,
    /// Half turn.
    Half,
    /// One quarter turn counter-clockwise (the same transform as 270° clockwise).
    CounterClockwise90,
}

impl Rotation {
    /// Map a raw wire value to a rotation.
    pub const fn from_raw(raw: i32) -> Self {
        match normalize_degrees(raw) {
            90 => Self::Clockwise90,
            180 => Self::Half,
            270 => Self::CounterClockwise90,
            _ => Self::None,
        }
    }

    /// Clockwise degrees this rotation represents.
    pub const fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Half => 180,
            Self::CounterClockwise90 => 270,
        }
    }

    /// Whether the rotation swaps width and height.
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Clockwise90 | Self::CounterClockwise90)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

// ── Resolution ───────────────────────────────────────────────────

/// Pixel dimensions of a canvas or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` if either dimension is zero.
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes needed for a packed RGB24 buffer of this size.
    pub const fn rgb_len(self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ── DecodedFrame ─────────────────────────────────────────────────

/// A decoded, orientation-corrected frame.
///
/// Cloning copies the pixel buffer; the pipeline hands copies to the
/// preview cache so the two never share mutable state.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Packed RGB8 pixels.
    pub image: RgbImage,
    /// Rotation that was applied after decoding.
    pub rotation: Rotation,
    /// Monotonic per-session frame counter, starting at 1.
    pub sequence: u64,
    /// When decoding finished.
    pub decoded_at: Instant,
}

impl DecodedFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Raw RGB bytes, `width * height * 3` long.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}
