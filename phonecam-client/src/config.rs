//! Client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Where the phone is.
    pub network: NetworkConfig,
    /// Backoff and shutdown timing.
    pub reconnect: ReconnectConfig,
    /// Virtual camera output.
    pub output: OutputConfig,
    /// Headless preview consumer.
    pub preview: PreviewConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// How the phone is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Directly over Wi-Fi at `network.host`.
    #[default]
    Network,
    /// Through a port forwarded to the loopback interface.
    Usb,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mode: Mode,
    /// Phone address in `network` mode.
    pub host: String,
    pub port: u16,
    /// Connect deadline in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-read deadline in milliseconds.
    pub read_timeout_ms: u64,
}

/// Reconnect settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Pause after a failed connect.
    pub retry_delay_ms: u64,
    /// Pause after a dropped connection.
    pub reset_delay_ms: u64,
    /// How long shutdown waits for the worker.
    pub stop_timeout_ms: u64,
}

/// Output sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Raw RGB24 device or FIFO. Empty disables the sink.
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Output frame-rate cap; 0 = uncapped.
    pub fps: u32,
}

/// Preview consumer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// How often the preview slot is polled.
    pub poll_interval_ms: u64,
    /// PNG file overwritten with the latest frame. Empty = off.
    pub snapshot_path: String,
    pub snapshot_interval_ms: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Network,
            host: "192.168.0.105".into(),
            port: 8554,
            connect_timeout_ms: 2000,
            read_timeout_ms: 3000,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 1000,
            reset_delay_ms: 500,
            stop_timeout_ms: 1000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            width: 1920,
            height: 1080,
            fps: 30,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 33,
            snapshot_path: String::new(),
            snapshot_interval_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl PreviewConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms.max(1))
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ClientConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }
}

// ── Tests ────────────────────────────────────────────────────────
