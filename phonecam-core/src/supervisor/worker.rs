//! The reconnect loop.
//!
//! ```text
//!            ┌──────────── retry_delay ────────────┐
//!            ▼                                     │ connect failed
//!   Disconnected ──► Connecting ──────────────────►┘
//!            ▲            │ ok
//!            │            ▼
//!            │       Connected ──► receive_packet ──► pipeline
//!            │            │  ▲           │
//!            │            │  └─ Timeout ─┘
//!            │            │ lost / end of stream / protocol violation
//!            └─ reset_delay (socket closed, preview cleared)
//! ```
//!
//! The cancellation token is checked at the top of every iteration and
//! raced against every suspension point (connect, read, backoff), so a
//! stop request is honoured without waiting out a timeout.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::cache::LatestFrameCache;
use crate::config::StreamConfig;
use crate::error::{Recovery, StreamError};
use crate::network::StreamClient;
use crate::packet::Packet;
use crate::pipeline::FramePipeline;
use crate::state::ConnectionState;
use crate::supervisor::stats::StatsRecorder;

/// Why the read loop returned.
enum ReadExit {
    Cancelled,
    Dropped(StreamError),
}

type Transition = fn(&mut ConnectionState) -> Result<(), StreamError>;

pub(crate) struct Worker {
    config: StreamConfig,
    client: StreamClient,
    pipeline: Option<FramePipeline>,
    cache: LatestFrameCache,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    stats: StatsRecorder,
    cancel: CancellationToken,
}

impl Worker {
    pub(crate) fn new(
        config: StreamConfig,
        pipeline: FramePipeline,
        cancel: CancellationToken,
        state_tx: watch::Sender<ConnectionState>,
        stats: StatsRecorder,
    ) -> Self {
        let client = StreamClient::new(config.endpoint.clone()).with_read_timeout(config.read_timeout);
        let cache = pipeline.cache().clone();
        Self {
            config,
            client,
            pipeline: Some(pipeline),
            cache,
            state: ConnectionState::Disconnected,
            state_tx,
            stats,
            cancel,
        }
    }

    /// Run until cancelled. Always releases the socket, sink and preview.
    pub(crate) async fn run(mut self) -> Result<(), StreamError> {
        info!(
            "stream worker started for {} (sink: {})",
            self.config.endpoint,
            self.pipeline
                .as_ref()
                .map(FramePipeline::sink_description)
                .unwrap_or_default()
        );

        let result = self.supervise().await;
        if let Err(e) = &result {
            error!("stream worker failed: {e}");
        }
        self.shutdown();
        result
    }

    async fn supervise(&mut self) -> Result<(), StreamError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            self.transition(ConnectionState::begin_connect)?;
            let attempt = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                result = self.client.connect(self.config.connect_timeout) => result,
            };

            if let Err(e) = attempt {
                self.transition(ConnectionState::connect_failed)?;
                debug!(
                    recovery = ?e.recovery(),
                    "{e}; retrying in {:?}",
                    self.config.retry_delay
                );
                if !backoff(&self.cancel, self.config.retry_delay).await {
                    return Ok(());
                }
                continue;
            }

            self.transition(ConnectionState::connect_succeeded)?;
            self.stats.record_connect();

            match self.read_loop().await? {
                ReadExit::Cancelled => return Ok(()),
                ReadExit::Dropped(e) => {
                    match &e {
                        StreamError::EndOfStream => info!("{} ended the stream", self.config.endpoint),
                        e if e.is_protocol_violation() => {
                            warn!("{} sent malformed data: {e}", self.config.endpoint)
                        }
                        e => warn!("{}: {e}", self.config.endpoint),
                    }

                    self.client.close();
                    self.cache.clear();
                    self.transition(ConnectionState::connection_dropped)?;
                    self.stats.record_disconnect();

                    debug!("reconnecting in {:?}", self.config.reset_delay);
                    if !backoff(&self.cancel, self.config.reset_delay).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn read_loop(&mut self) -> Result<ReadExit, StreamError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(ReadExit::Cancelled);
            }

            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(ReadExit::Cancelled),
                result = self.client.receive_packet() => result,
            };

            match received {
                Ok(packet) => self.process(packet).await?,
                Err(e) => match e.recovery() {
                    Recovery::KeepConnection => {
                        trace!("{e}; connection kept");
                        self.stats.record_timeout();
                    }
                    _ => return Ok(ReadExit::Dropped(e)),
                },
            }
        }
    }

    /// Run the pipeline for one packet off the async executor.
    ///
    /// A panic in the decoder or sink is contained here and costs only
    /// the frame; the pipeline is handed back either way.
    async fn process(&mut self, packet: Packet) -> Result<(), StreamError> {
        let mut pipeline = self
            .pipeline
            .take()
            .ok_or_else(|| StreamError::Worker("frame pipeline unavailable".into()))?;
        let bytes = packet.wire_len();

        let (pipeline, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| pipeline.process(&packet)))
                .unwrap_or_else(|payload| {
                    Err(StreamError::Decode(format!(
                        "frame processing panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
            (pipeline, outcome)
        })
        .await
        .map_err(|e| StreamError::Worker(format!("frame processing failed: {e}")))?;
        self.pipeline = Some(pipeline);

        match outcome {
            Ok(report) => self.stats.record_frame(bytes, &report),
            Err(e) => {
                warn!(recovery = ?e.recovery(), "dropping frame: {e}");
                self.stats.record_dropped(bytes);
            }
        }
        Ok(())
    }

    fn transition(&mut self, step: Transition) -> Result<(), StreamError> {
        step(&mut self.state)?;
        trace!("connection state: {}", self.state);
        self.state_tx.send_replace(self.state.clone());
        Ok(())
    }

    fn shutdown(&mut self) {
        self.client.close();
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.close();
        }
        self.cache.clear();
        self.state.force_disconnect();
        self.state_tx.send_replace(self.state.clone());
        info!("stream worker for {} stopped", self.config.endpoint);
    }
}

/// Sleep for `delay` unless cancelled first. Returns `false` on cancel.
async fn backoff(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let payload = panic::catch_unwind(|| -> u8 { panic!("decoder bug") }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "decoder bug");

        let payload = panic::catch_unwind(|| -> u8 { panic!("bad frame {}", 7) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "bad frame 7");

        let payload = panic::catch_unwind(|| -> u8 { panic::panic_any(42u8) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
