//! Connection state machine owned by the ingestion worker.
//!
//! Transitions are validated and return `Result` instead of panicking,
//! so a logic slip in the worker shows up as a logged error rather
//! than a silently wrong state.

use std::time::Instant;

use crate::error::StreamError;

// ── ConnectionState ──────────────────────────────────────────────

/// Where the worker is in its connect/read cycle.
///
/// ```text
///  Disconnected ──► Connecting ──► Connected
///       ▲               │              │
///       └───────────────┴──────────────┘
///         (connect failed / connection dropped)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket. Initial state, and the state between attempts.
    #[default]
    Disconnected,

    /// A connect attempt is in flight.
    Connecting,

    /// Socket is up; the worker is reading packets.
    Connected {
        /// When the connection was established.
        since: Instant,
    },
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected { .. } => write!(f, "Connected"),
        }
    }
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// How long the current connection has been up.
    ///
    /// Returns `None` for any other state.
    pub fn connected_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Connected { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Disconnected`.
    pub fn begin_connect(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Disconnected => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(StreamError::Worker(format!(
                "cannot connect: state is {self}"
            ))),
        }
    }

    /// Transition to `Connected`.
    ///
    /// Valid from: `Connecting`.
    pub fn connect_succeeded(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Connecting => {
                *self = Self::Connected {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(StreamError::Worker(format!(
                "cannot complete connect: state is {self}"
            ))),
        }
    }

    /// Transition back to `Disconnected` after a failed attempt.
    ///
    /// Valid from: `Connecting`.
    pub fn connect_failed(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Connecting => {
                *self = Self::Disconnected;
                Ok(())
            }
            _ => Err(StreamError::Worker(format!(
                "cannot fail connect: state is {self}"
            ))),
        }
    }

    /// Transition to `Disconnected` after the connection dropped.
    ///
    /// Valid from: `Connected`.
    pub fn connection_dropped(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Connected { .. } => {
                *self = Self::Disconnected;
                Ok(())
            }
            _ => Err(StreamError::Worker(format!(
                "cannot drop connection: state is {self}"
            ))),
        }
    }

    /// Force-reset to `Disconnected` regardless of current state.
    ///
    /// Used on shutdown.
    pub fn force_disconnect(&mut self) {
        *self = Self::Disconnected;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut state = ConnectionState::Disconnected;

        state.begin_connect().unwrap();
        assert_eq!(state, ConnectionState::Connecting);

        state.connect_succeeded().unwrap();
        assert!(state.is_connected());
        assert!(state.connected_duration().is_some());

        state.connection_dropped().unwrap();
        assert!(state.is_disconnected());
    }

    #[test]
    fn failed_attempt_returns_to_disconnected() {
        let mut state = ConnectionState::Disconnected;
        state.begin_connect().unwrap();
        state.connect_failed().unwrap();
        assert!(state.is_disconnected());
        assert!(state.connected_duration().is_none());
    }

    #[test]
    fn invalid_transition_connect_when_connected() {
        let mut state = ConnectionState::Connected {
            since: Instant::now(),
        };
        assert!(state.begin_connect().is_err());
    }

    #[test]
    fn invalid_transition_succeed_from_disconnected() {
        let mut state = ConnectionState::Disconnected;
        assert!(state.connect_succeeded().is_err());
    }

    #[test]
    fn invalid_transition_drop_from_connecting() {
        let mut state = ConnectionState::Connecting;
        assert!(state.connection_dropped().is_err());
    }

    #[test]
    fn force_disconnect_from_any_state() {
        let mut state = ConnectionState::Connected {
            since: Instant::now(),
        };
        state.force_disconnect();
        assert!(state.is_disconnected());

        let mut state = ConnectionState::Connecting;
        state.force_disconnect();
        assert!(state.is_disconnected());
    }

    #[test]
    fn display_format() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(ConnectionState::Connecting.to_string(), "Connecting");
        assert_eq!(
            ConnectionState::Connected {
                since: Instant::now()
            }
            .to_string(),
            "Connected"
        );
    }

    #[test]
    fn default_state_is_disconnected() {
        assert!(ConnectionState::default().is_disconnected());
    }
}
