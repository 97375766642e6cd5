//! Per-session counters exposed to the UI.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::pipeline::FrameReport;

/// Number of inter-frame gaps averaged for the fps estimate.
const FPS_WINDOW: usize = 60;

/// Ingestion statistics, published after every state-changing event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Current smoothed frames per second.
    pub fps: f64,
    /// Frames decoded and published since start.
    pub total_frames: u64,
    /// Packet bytes received (compressed, from the network).
    pub total_bytes: u64,
    /// Packets received but not decodable.
    pub dropped_frames: u64,
    /// Canvases the sink rejected.
    pub sink_failures: u64,
    /// Canvases the sink dropped on purpose (frame-rate cap).
    pub sink_skipped: u64,
    /// Successful connects.
    pub connects: u64,
    /// Connections torn down by loss, end of stream or protocol violation.
    pub disconnects: u64,
    /// Read timeouts while connected.
    pub timeouts: u64,
    /// Last frame width.
    pub width: u32,
    /// Last frame height.
    pub height: u32,
}

/// Worker-side accumulator behind the stats watch channel.
pub(crate) struct StatsRecorder {
    stats: FrameStats,
    samples: VecDeque<Duration>,
    last_frame: Option<Instant>,
    tx: watch::Sender<FrameStats>,
}

impl StatsRecorder {
    pub(crate) fn new(tx: watch::Sender<FrameStats>) -> Self {
        Self {
            stats: FrameStats::default(),
            samples: VecDeque::with_capacity(FPS_WINDOW),
            last_frame: None,
            tx,
        }
    }

    pub(crate) fn record_frame(&mut self, bytes: usize, report: &FrameReport) {
        self.stats.total_frames += 1;
        self.stats.total_bytes += bytes as u64;
        self.stats.width = report.resolution.width;
        self.stats.height = report.resolution.height;
        if report.sink_failed {
            self.stats.sink_failures += 1;
        }
        if report.sink_skipped {
            self.stats.sink_skipped += 1;
        }

        let now = Instant::now();
        if let Some(last) = self.last_frame {
            if self.samples.len() == FPS_WINDOW {
                self.samples.pop_front();
            }
            self.samples.push_back(now.duration_since(last));
        }
        self.last_frame = Some(now);

        let avg_secs = if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().map(Duration::as_secs_f64).sum::<f64>() / self.samples.len() as f64
        };
        self.stats.fps = if avg_secs > 0.0 { 1.0 / avg_secs } else { 0.0 };

        self.publish();
    }

    pub(crate) fn record_dropped(&mut self, bytes: usize) {
        self.stats.dropped_frames += 1;
        self.stats.total_bytes += bytes as u64;
        self.publish();
    }

    pub(crate) fn record_timeout(&mut self) {
        self.stats.timeouts += 1;
        self.publish();
    }

    pub(crate) fn record_connect(&mut self) {
        self.stats.connects += 1;
        self.publish();
    }

    pub(crate) fn record_disconnect(&mut self) {
        self.stats.disconnects += 1;
        // A reconnect gap is not an inter-frame interval.
        self.last_frame = None;
        self.samples.clear();
        self.stats.fps = 0.0;
        self.publish();
    }

    fn publish(&self) {
        self.tx.send_replace(self.stats.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::types::{Resolution, Rotation};

    fn report(sink_failed: bool) -> FrameReport {
        FrameReport {
            sequence: 1,
            resolution: Resolution::new(640, 480),
            rotation: Rotation::None,
            delivered_to_sink: !sink_failed,
            sink_skipped: false,
            sink_failed,
        }
    }

    #[test]
    fn counts_frames_and_bytes() {
        let (tx, rx) = watch::channel(FrameStats::default());
        let mut rec = StatsRecorder::new(tx);

        rec.record_frame(100, &report(false));
        rec.record_frame(50, &report(true));
        rec.record_dropped(10);
        rec.record_frame(5, &FrameReport {
            sink_skipped: true,
            delivered_to_sink: false,
            ..report(false)
        });

        let stats = rx.borrow().clone();
        assert_eq!(stats.total_frames, 3);
        assert_eq!(stats.total_bytes, 165);
        assert_eq!(stats.dropped_frames, 1);
        assert_eq!(stats.sink_failures, 1);
        assert_eq!(stats.sink_skipped, 1);
        assert_eq!((stats.width, stats.height), (640, 480));
    }

    #[test]
    fn disconnect_resets_fps() {
        let (tx, rx) = watch::channel(FrameStats::default());
        let mut rec = StatsRecorder::new(tx);

        rec.record_connect();
        rec.record_frame(1, &report(false));
        std::thread::sleep(Duration::from_millis(5));
        rec.record_frame(1, &report(false));
        assert!(rx.borrow().fps > 0.0);

        rec.record_disconnect();
        let stats = rx.borrow().clone();
        assert_eq!(stats.fps, 0.0);
        assert_eq!(stats.connects, 1);
        assert_eq!(stats.disconnects, 1);
    }
}
