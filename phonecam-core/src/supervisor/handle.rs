//! Owner-side lifecycle handle for one ingestion worker.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cache::LatestFrameCache;
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::frame::types::DecodedFrame;
use crate::network::Endpoint;
use crate::pipeline::FramePipeline;
use crate::state::ConnectionState;
use crate::supervisor::stats::{FrameStats, StatsRecorder};
use crate::supervisor::worker::Worker;

/// Start/stop handle for a running stream.
///
/// Dropping the handle requests a stop but does not wait for it.
pub struct StreamHandle {
    endpoint: Endpoint,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<(), StreamError>>>,
    cache: LatestFrameCache,
    state_rx: watch::Receiver<ConnectionState>,
    stats_rx: watch::Receiver<FrameStats>,
    stop_timeout: Duration,
}

impl StreamHandle {
    /// Validate `config` and spawn the worker on the current Tokio runtime.
    ///
    /// An invalid configuration is returned immediately and no worker
    /// is started.
    pub fn start(config: StreamConfig, pipeline: FramePipeline) -> Result<Self, StreamError> {
        config.validate()?;

        let cancel = CancellationToken::new();
        let cache = pipeline.cache().clone();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (stats_tx, stats_rx) = watch::channel(FrameStats::default());

        let endpoint = config.endpoint.clone();
        let stop_timeout = config.stop_timeout;
        let worker = Worker::new(
            config,
            pipeline,
            cancel.clone(),
            state_tx,
            StatsRecorder::new(stats_tx),
        );
        let task = tokio::spawn(worker.run());

        Ok(Self {
            endpoint,
            cancel,
            task: Some(task),
            cache,
            state_rx,
            stats_rx,
            stop_timeout,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The preview slot this worker publishes into.
    pub fn cache(&self) -> &LatestFrameCache {
        &self.cache
    }

    /// Copy of the latest decoded frame, if any.
    pub fn peek(&self) -> Option<DecodedFrame> {
        self.cache.peek()
    }

    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats_rx.borrow().clone()
    }

    pub fn stats_receiver(&self) -> watch::Receiver<FrameStats> {
        self.stats_rx.clone()
    }

    /// Whether the worker task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Ask the worker to stop. Returns immediately.
    pub fn request_stop(&self) {
        self.cancel.cancel();
    }

    /// Wait up to `timeout` for the worker to exit.
    ///
    /// A worker that overruns the budget is aborted and
    /// [`StreamError::StopTimeout`] is returned. Calling this again
    /// after the worker has exited returns `Ok(())`.
    pub async fn await_stopped(&mut self, timeout: Duration) -> Result<(), StreamError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                self.task = None;
                joined.map_err(|e| StreamError::Worker(e.to_string()))?
            }
            Err(_) => {
                if let Some(task) = self.task.take() {
                    task.abort();
                }
                self.cache.clear();
                warn!("stream worker for {} did not stop within {timeout:?}; aborted", self.endpoint);
                Err(StreamError::StopTimeout(timeout))
            }
        }
    }

    /// `request_stop` followed by `await_stopped` with the configured budget.
    pub async fn stop(mut self) -> Result<(), StreamError> {
        self.request_stop();
        let timeout = self.stop_timeout;
        self.await_stopped(timeout).await
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
