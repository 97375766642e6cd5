//! Raw RGB24 sink for loopback video devices and pipes.
//!
//! Each canvas is written as one packed `width * height * 3` byte
//! frame, the layout a v4l2loopback node configured for RGB24 or an
//! `ffmpeg -f rawvideo -pix_fmt rgb24` reader expects.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::{debug, info};

use crate::error::StreamError;
use crate::frame::types::Resolution;
use crate::sink::{Delivery, FrameSink, check_canvas};

pub struct RawVideoSink {
    path: PathBuf,
    file: Option<File>,
    resolution: Resolution,
    /// Minimum spacing between written frames; `None` = unthrottled.
    frame_interval: Option<Duration>,
    last_write: Option<Instant>,
    frames_written: u64,
}

impl RawVideoSink {
    /// Open `path` for writing (created if it is a plain file).
    pub fn open(path: impl AsRef<Path>, resolution: Resolution) -> Result<Self, StreamError> {
        let path = path.as_ref().to_path_buf();
        if resolution.is_empty() {
            return Err(StreamError::Sink(format!(
                "invalid sink resolution {resolution}"
            )));
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StreamError::Sink(format!("open {}: {e}", path.display())))?;

        info!("raw video sink on {} at {resolution}", path.display());
        Ok(Self {
            path,
            file: Some(file),
            resolution,
            frame_interval: None,
            last_write: None,
            frames_written: 0,
        })
    }

    /// Cap output at `fps`; surplus canvases are dropped, newest wins.
    pub fn with_max_fps(mut self, fps: u32) -> Self {
        self.frame_interval = (fps > 0).then(|| Duration::from_secs(1) / fps);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn throttled(&self, now: Instant) -> bool {
        match (self.frame_interval, self.last_write) {
            (Some(interval), Some(last)) => now.duration_since(last) < interval,
            _ => false,
        }
    }
}

impl FrameSink for RawVideoSink {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn is_active(&self) -> bool {
        self.file.is_some()
    }

    fn send(&mut self, canvas: &RgbImage) -> Result<Delivery, StreamError> {
        check_canvas(canvas, self.resolution)?;

        let now = Instant::now();
        if self.throttled(now) {
            return Ok(Delivery::Skipped);
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StreamError::Sink("sink is closed".into()))?;
        file.write_all(canvas.as_raw())
            .map_err(|e| StreamError::Sink(format!("write {}: {e}", self.path.display())))?;

        self.last_write = Some(now);
        self.frames_written += 1;
        Ok(Delivery::Written)
    }

    fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
            debug!(
                "raw video sink {} closed after {} frames",
                self.path.display(),
                self.frames_written
            );
        }
    }

    fn describe(&self) -> String {
        format!("raw:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn writes_packed_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.rgb");

        let mut sink = RawVideoSink::open(&path, Resolution::new(4, 2)).unwrap();
        assert!(sink.is_active());
        sink.send(&RgbImage::from_pixel(4, 2, Rgb([1, 2, 3]))).unwrap();
        sink.send(&RgbImage::from_pixel(4, 2, Rgb([4, 5, 6]))).unwrap();
        sink.close();
        assert!(!sink.is_active());

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 2 * 4 * 2 * 3);
        assert_eq!(&bytes[..3], &[1, 2, 3]);
        assert_eq!(&bytes[24..27], &[4, 5, 6]);
    }

    #[test]
    fn rejects_wrong_canvas_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RawVideoSink::open(dir.path().join("out.rgb"), Resolution::new(4, 2)).unwrap();
        assert!(sink.send(&RgbImage::new(2, 4)).is_err());
    }

    #[test]
    fn throttle_drops_surplus_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RawVideoSink::open(dir.path().join("out.rgb"), Resolution::new(1, 1))
            .unwrap()
            .with_max_fps(1);

        let outcomes: Vec<Delivery> = (0..5)
            .map(|_| sink.send(&RgbImage::new(1, 1)).unwrap())
            .collect();
        assert_eq!(outcomes[0], Delivery::Written);
        assert!(outcomes[1..].iter().all(|d| *d == Delivery::Skipped));
        assert_eq!(sink.frames_written(), 1);
    }

    #[test]
    fn send_after_close_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RawVideoSink::open(dir.path().join("out.rgb"), Resolution::new(1, 1)).unwrap();
        sink.close();
        sink.close();
        assert!(matches!(sink.send(&RgbImage::new(1, 1)), Err(StreamError::Sink(_))));
    }

    #[test]
    fn open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = RawVideoSink::open(dir.path().join("nope/out.rgb"), Resolution::new(1, 1));
        assert!(matches!(err, Err(StreamError::Sink(_))));
    }
}
