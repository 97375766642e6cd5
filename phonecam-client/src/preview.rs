//! Headless preview consumer.
//!
//! Stands in for a UI: polls the preview slot at a fixed cadence, logs
//! when the signal appears, disappears or changes size, and optionally
//! keeps a PNG snapshot of the latest frame on disk.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use phonecam_core::{DecodedFrame, LatestFrameCache, Resolution};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;

/// What the preview currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    NoSignal,
    Live(Resolution),
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSignal => write!(f, "no signal"),
            Self::Live(res) => write!(f, "live {res}"),
        }
    }
}

/// Result of one poll.
#[derive(Debug, Default)]
pub struct Observation {
    /// Set when the signal differs from the previous poll.
    pub change: Option<Signal>,
    /// Frame due to be written as a snapshot.
    pub snapshot: Option<DecodedFrame>,
}

struct SnapshotSchedule {
    path: PathBuf,
    interval: Duration,
    last_written: Option<Instant>,
    last_sequence: u64,
}

pub struct PreviewMonitor {
    cache: LatestFrameCache,
    poll_interval: Duration,
    signal: Signal,
    last_sequence: Option<u64>,
    frames_seen: u64,
    snapshot: Option<SnapshotSchedule>,
}

impl PreviewMonitor {
    pub fn new(cache: LatestFrameCache, config: &PreviewConfig) -> Self {
        let snapshot = (!config.snapshot_path.is_empty()).then(|| SnapshotSchedule {
            path: PathBuf::from(&config.snapshot_path),
            interval: config.snapshot_interval(),
            last_written: None,
            last_sequence: 0,
        });
        Self {
            cache,
            poll_interval: config.poll_interval(),
            signal: Signal::NoSignal,
            last_sequence: None,
            frames_seen: 0,
            snapshot,
        }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Distinct frames observed so far.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Read the preview slot once.
    pub fn observe(&mut self, now: Instant) -> Observation {
        let frame = self.cache.peek();

        let signal = match &frame {
            Some(f) => Signal::Live(f.resolution()),
            None => Signal::NoSignal,
        };
        let change = (signal != self.signal).then_some(signal);
        self.signal = signal;

        let Some(frame) = frame else {
            self.last_sequence = None;
            return Observation { change, snapshot: None };
        };

        if self.last_sequence != Some(frame.sequence) {
            self.last_sequence = Some(frame.sequence);
            self.frames_seen += 1;
        }

        let snapshot = match self.snapshot.as_mut() {
            Some(s) if s.last_sequence != frame.sequence && s.due(now) => {
                s.last_written = Some(now);
                s.last_sequence = frame.sequence;
                Some(frame)
            }
            _ => None,
        };

        Observation { change, snapshot }
    }

    /// Poll until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let observation = self.observe(Instant::now());
            if let Some(signal) = observation.change {
                info!("preview: {signal}");
            }
            if let (Some(frame), Some(schedule)) = (observation.snapshot, self.snapshot.as_ref()) {
                let path = schedule.path.clone();
                tokio::task::spawn_blocking(move || save_snapshot(&frame, &path));
            }
        }

        debug!("preview monitor stopped after {} frames", self.frames_seen);
    }
}

impl SnapshotSchedule {
    fn due(&self, now: Instant) -> bool {
        self.last_written
            .is_none_or(|last| now.duration_since(last) >= self.interval)
    }
}

fn save_snapshot(frame: &DecodedFrame, path: &Path) {
    match frame.image.save(path) {
        Ok(()) => debug!("snapshot {} written to {}", frame.sequence, path.display()),
        Err(e) => warn!("snapshot to {} failed: {e}", path.display()),
    }
}
