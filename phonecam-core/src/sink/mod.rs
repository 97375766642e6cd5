//! Output sink capability.
//!
//! The pipeline hands every composited canvas to a `Box<dyn FrameSink>`.
//! Whether that sink is a real device or [`NullSink`] is decided once,
//! by the owner, before the worker starts; an absent device is a normal
//! runtime state, not an error.

mod raw;

pub use raw::RawVideoSink;

use image::RgbImage;

use crate::error::StreamError;
use crate::frame::types::Resolution;

/// What a sink did with a canvas it accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The canvas reached the device.
    Written,
    /// The canvas was dropped on purpose, e.g. by a frame-rate cap.
    Skipped,
}

/// Consumer of fixed-resolution RGB canvases.
pub trait FrameSink: Send {
    /// Canvas size this sink expects.
    fn resolution(&self) -> Resolution;

    /// Whether canvases should be produced at all. A sink that returns
    /// `false` lets the pipeline skip compositing.
    fn is_active(&self) -> bool {
        true
    }

    /// Deliver one canvas of exactly [`FrameSink::resolution`] pixels.
    fn send(&mut self, canvas: &RgbImage) -> Result<Delivery, StreamError>;

    /// Release the underlying device. Called once when the worker exits.
    fn close(&mut self) {}

    /// Short name for logs.
    fn describe(&self) -> String;
}

// ── NullSink ─────────────────────────────────────────────────────

/// Stand-in used when no output device is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn resolution(&self) -> Resolution {
        Resolution::new(0, 0)
    }

    fn is_active(&self) -> bool {
        false
    }

    fn send(&mut self, _canvas: &RgbImage) -> Result<Delivery, StreamError> {
        Ok(Delivery::Skipped)
    }

    fn describe(&self) -> String {
        "none".into()
    }
}

/// Check a canvas against the sink's declared resolution.
pub(crate) fn check_canvas(canvas: &RgbImage, expected: Resolution) -> Result<(), StreamError> {
    if canvas.width() != expected.width || canvas.height() != expected.height {
        return Err(StreamError::Sink(format!(
            "canvas {}x{} does not match sink resolution {expected}",
            canvas.width(),
            canvas.height()
        )));
    }
    Ok(())
}
