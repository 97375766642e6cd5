//! Domain-specific error types for the PhoneCam stream core.
//!
//! Every failure inside the ingestion worker maps to one variant of
//! [`StreamError`], and every variant maps to exactly one [`Recovery`]
//! policy. The worker decides what to do from the classification alone.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the stream core.
#[derive(Debug, Error)]
pub enum StreamError {
    // ── Transport Errors ─────────────────────────────────────────
    /// Opening the TCP connection failed (refused, unreachable, timed out).
    #[error("connect to {addr} failed: {source}")]
    Transport {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// No complete packet arrived within the read timeout.
    #[error("no data within {0:?}")]
    Timeout(Duration),

    /// The peer closed the socket or the read failed mid-packet.
    #[error("connection lost: {0}")]
    ConnectionLost(#[from] std::io::Error),

    /// A read was attempted on a client with no open socket.
    #[error("not connected")]
    NotConnected,

    // ── Protocol Errors ──────────────────────────────────────────
    /// The peer sent the zero-length End-Of-Stream sentinel.
    #[error("peer signalled end of stream")]
    EndOfStream,

    /// The length header exceeds the frame cap.
    #[error("protocol violation: frame of {size} bytes exceeds {max}")]
    FrameTooLarge { size: u32, max: u32 },

    /// A packet violated framing rules in some other way.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    // ── Frame Errors ─────────────────────────────────────────────
    /// The packet body could not be decoded into pixels.
    #[error("frame decode failed: {0}")]
    Decode(String),

    /// The output sink rejected a composited frame.
    #[error("sink error: {0}")]
    Sink(String),

    // ── Lifecycle Errors ─────────────────────────────────────────
    /// The stream configuration is unusable; the worker is never started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker did not exit within the stop budget.
    #[error("worker did not stop within {0:?}")]
    StopTimeout(Duration),

    /// The worker task failed (panicked or was aborted).
    #[error("worker failed: {0}")]
    Worker(String),
}

// ── Recovery ─────────────────────────────────────────────────────

/// What the ingestion worker does after a given error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Back off and try to connect again.
    RetryConnect,
    /// Keep the socket and read again.
    KeepConnection,
    /// Close the socket, clear the preview, back off, reconnect.
    Reconnect,
    /// Drop this frame only.
    SkipFrame,
    /// Drop this frame's sink output; cache path is unaffected.
    SkipSinkOutput,
    /// Surface to the owner; nothing to recover inside the worker.
    Fatal,
}

impl StreamError {
    /// Classify the error into its recovery policy.
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Transport { .. } => Recovery::RetryConnect,
            Self::Timeout(_) => Recovery::KeepConnection,
            Self::ConnectionLost(_)
            | Self::NotConnected
            | Self::EndOfStream
            | Self::FrameTooLarge { .. }
            | Self::ProtocolViolation(_) => Recovery::Reconnect,
            Self::Decode(_) => Recovery::SkipFrame,
            Self::Sink(_) => Recovery::SkipSinkOutput,
            Self::InvalidConfig(_) | Self::StopTimeout(_) | Self::Worker(_) => Recovery::Fatal,
        }
    }

    /// `true` for errors that tear down the current connection.
    pub fn is_fatal_to_connection(&self) -> bool {
        self.recovery() == Recovery::Reconnect
    }

    /// `true` for malformed framing from the peer.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::FrameTooLarge { .. } | Self::ProtocolViolation(_))
    }
}

impl From<image::ImageError> for StreamError {
    fn from(e: image::ImageError) -> Self {
        StreamError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = StreamError::FrameTooLarge {
            size: 20_000_001,
            max: 20_000_000,
        };
        assert!(e.to_string().contains("20000001"));
        assert!(e.to_string().contains("protocol violation"));

        let e = StreamError::Timeout(Duration::from_secs(3));
        assert!(e.to_string().contains("3s"));
    }

    #[test]
    fn from_io_is_connection_lost() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let e: StreamError = io_err.into();
        assert!(matches!(e, StreamError::ConnectionLost(_)));
        assert!(e.is_fatal_to_connection());
    }

    #[test]
    fn timeout_keeps_connection() {
        let e = StreamError::Timeout(Duration::from_secs(3));
        assert_eq!(e.recovery(), Recovery::KeepConnection);
        assert!(!e.is_fatal_to_connection());
    }

    #[test]
    fn classification_table() {
        let transport = StreamError::Transport {
            addr: "127.0.0.1:8554".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(transport.recovery(), Recovery::RetryConnect);
        assert_eq!(StreamError::EndOfStream.recovery(), Recovery::Reconnect);
        assert_eq!(
            StreamError::ProtocolViolation("empty body").recovery(),
            Recovery::Reconnect
        );
        assert_eq!(StreamError::Decode("bad".into()).recovery(), Recovery::SkipFrame);
        assert_eq!(StreamError::Sink("gone".into()).recovery(), Recovery::SkipSinkOutput);
        assert_eq!(
            StreamError::InvalidConfig("missing host".into()).recovery(),
            Recovery::Fatal
        );
    }

    #[test]
    fn protocol_violation_grouping() {
        assert!(StreamError::FrameTooLarge { size: 1, max: 0 }.is_protocol_violation());
        assert!(StreamError::ProtocolViolation("x").is_protocol_violation());
        assert!(!StreamError::EndOfStream.is_protocol_violation());
    }
}
