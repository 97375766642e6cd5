//! Per-packet frame processing: decode → rotate → publish → composite → sink.
//!
//! Runs synchronously, one packet at a time, on whichever thread the
//! worker hands it to. Decode failures drop the frame; sink failures
//! drop only the sink output. Neither touches the connection.

use std::time::Instant;

use tracing::{debug, warn};

use crate::cache::LatestFrameCache;
use crate::error::StreamError;
use crate::frame::compositor::Compositor;
use crate::frame::decoder::{FrameCodec, ImageCodec};
use crate::frame::rotate::rotate;
use crate::frame::types::{DecodedFrame, Resolution, Rotation};
use crate::packet::Packet;
use crate::sink::{Delivery, FrameSink, NullSink};

/// Summary of one processed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub sequence: u64,
    pub resolution: Resolution,
    pub rotation: Rotation,
    /// `true` if the canvas was written to the sink.
    pub delivered_to_sink: bool,
    /// `true` if the sink accepted but deliberately dropped the canvas.
    pub sink_skipped: bool,
    /// `true` if the sink was active but rejected the canvas.
    pub sink_failed: bool,
}

pub struct FramePipeline {
    codec: Box<dyn FrameCodec>,
    sink: Box<dyn FrameSink>,
    compositor: Compositor,
    cache: LatestFrameCache,
    sequence: u64,
}

impl FramePipeline {
    /// Pipeline with the `image` decoder and no sink.
    pub fn new(cache: LatestFrameCache) -> Self {
        Self::with_parts(Box::new(ImageCodec::new()), Box::new(NullSink), cache)
    }

    pub fn with_parts(
        codec: Box<dyn FrameCodec>,
        sink: Box<dyn FrameSink>,
        cache: LatestFrameCache,
    ) -> Self {
        let compositor = Compositor::new(sink.resolution());
        Self {
            codec,
            sink,
            compositor,
            cache,
            sequence: 0,
        }
    }

    /// Replace the sink (and the compositor target with it).
    pub fn with_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.compositor = Compositor::new(sink.resolution());
        self.sink = sink;
        self
    }

    pub fn cache(&self) -> &LatestFrameCache {
        &self.cache
    }

    pub fn sink_description(&self) -> String {
        self.sink.describe()
    }

    /// Process one packet.
    ///
    /// Returns [`StreamError::Decode`] if the body is not an image; the
    /// cache and sink are left untouched in that case. Sink errors are
    /// logged and reported through [`FrameReport::sink_failed`].
    pub fn process(&mut self, packet: &Packet) -> Result<FrameReport, StreamError> {
        let decoded = self.codec.decode(packet.body())?;

        let rotation = packet.rotation();
        let image = rotate(decoded, rotation);

        self.sequence += 1;
        let frame = DecodedFrame {
            image,
            rotation,
            sequence: self.sequence,
            decoded_at: Instant::now(),
        };
        let resolution = frame.resolution();

        let (delivered_to_sink, sink_skipped, sink_failed) = if self.sink.is_active() {
            let canvas = self.compositor.compose(&frame.image);
            self.cache.publish(frame);
            match self.sink.send(&canvas) {
                Ok(Delivery::Written) => (true, false, false),
                Ok(Delivery::Skipped) => (false, true, false),
                Err(e) => {
                    warn!(recovery = ?e.recovery(), "dropping sink output for frame {}: {e}", self.sequence);
                    (false, false, true)
                }
            }
        } else {
            self.cache.publish(frame);
            (false, false, false)
        };

        debug!(
            "frame {} {resolution} rotated {rotation}",
            self.sequence
        );

        Ok(FrameReport {
            sequence: self.sequence,
            resolution,
            rotation,
            delivered_to_sink,
            sink_skipped,
            sink_failed,
        })
    }

    /// Release the sink. Called once by the worker on exit.
    pub fn close(&mut self) {
        self.sink.close();
    }
}
