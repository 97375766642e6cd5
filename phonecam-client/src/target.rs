//! Resolve the client configuration into a worker configuration.

use std::time::Duration;

use phonecam_core::{Endpoint, StreamConfig, StreamError};

use crate::config::{ClientConfig, Mode};

/// Loopback address a USB port forward listens on.
pub const USB_HOST: &str = "127.0.0.1";

/// Endpoint for the configured mode.
pub fn resolve_endpoint(config: &ClientConfig) -> Result<Endpoint, StreamError> {
    let net = &config.network;
    match net.mode {
        Mode::Usb => Ok(Endpoint::new(USB_HOST, net.port)),
        Mode::Network => {
            let host = net.host.trim();
            if host.is_empty() {
                return Err(StreamError::InvalidConfig(
                    "network mode requires network.host".into(),
                ));
            }
            Ok(Endpoint::new(host, net.port))
        }
    }
}

/// Full worker configuration, validated.
pub fn stream_config(config: &ClientConfig) -> Result<StreamConfig, StreamError> {
    let net = &config.network;
    let rc = &config.reconnect;
    let stream = StreamConfig::new(resolve_endpoint(config)?)
        .with_connect_timeout(Duration::from_millis(net.connect_timeout_ms))
        .with_read_timeout(Duration::from_millis(net.read_timeout_ms))
        .with_retry_delay(Duration::from_millis(rc.retry_delay_ms))
        .with_reset_delay(Duration::from_millis(rc.reset_delay_ms))
        .with_stop_timeout(Duration::from_millis(rc.stop_timeout_ms));
    stream.validate()?;
    Ok(stream)
}
