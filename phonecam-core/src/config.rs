//! Stream worker configuration.

use std::time::Duration;

use crate::error::StreamError;
use crate::network::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, Endpoint};

/// Pause after a failed connect attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Pause after a dropped connection before reconnecting.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(500);

/// How long the owner waits for the worker to exit.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything the ingestion worker needs to know up front.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoint: Endpoint,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub retry_delay: Duration,
    pub reset_delay: Duration,
    pub stop_timeout: Duration,
}

impl StreamConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            reset_delay: DEFAULT_RESET_DELAY,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Reject configurations the worker cannot run with.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.endpoint.host().trim().is_empty() {
            return Err(StreamError::InvalidConfig("missing target host".into()));
        }
        if self.endpoint.port() == 0 {
            return Err(StreamError::InvalidConfig("target port must be non-zero".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(StreamError::InvalidConfig("connect timeout must be non-zero".into()));
        }
        if self.read_timeout.is_zero() {
            return Err(StreamError::InvalidConfig("read timeout must be non-zero".into()));
        }
        Ok(())
    }
}
