//! One TCP connection to the phone and the packet reader on top of it.
//!
//! The client holds no state between connections: every successful
//! [`StreamClient::connect`] opens a fresh socket with an empty read
//! buffer, and [`StreamClient::close`] drops both.

use std::time::Duration;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

use crate::codec::PacketCodec;
use crate::error::StreamError;
use crate::packet::Packet;

/// Default bound on opening the socket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on waiting for one packet. Longer than any sane
/// inter-frame gap so a slow phone is not mistaken for a dead one.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

// ── Endpoint ─────────────────────────────────────────────────────

/// Host/port pair supplied by whatever discovered the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── StreamClient ─────────────────────────────────────────────────

/// Reads [`Packet`]s from a single TCP connection.
#[derive(Debug)]
pub struct StreamClient {
    endpoint: Endpoint,
    read_timeout: Duration,
    codec: PacketCodec,
    framed: Option<FramedRead<TcpStream, PacketCodec>>,
}

impl StreamClient {
    /// A disconnected client for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            read_timeout: DEFAULT_READ_TIMEOUT,
            codec: PacketCodec::new(),
            framed: None,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_codec(mut self, codec: PacketCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Open the TCP connection, bounded by `connect_timeout`.
    ///
    /// Any previous socket is closed first. On failure the client is
    /// left disconnected and nothing else changes.
    pub async fn connect(&mut self, connect_timeout: Duration) -> Result<(), StreamError> {
        self.close();

        let addr = self.endpoint.to_string();
        let connect = TcpStream::connect((self.endpoint.host(), self.endpoint.port()));
        let stream = match tokio::time::timeout(connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(StreamError::Transport { addr, source }),
            Err(_) => {
                return Err(StreamError::Transport {
                    addr,
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("no answer within {connect_timeout:?}"),
                    ),
                });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay on {addr} failed: {e}");
        }

        info!("connected to {addr}");
        self.framed = Some(FramedRead::new(stream, self.codec));
        Ok(())
    }

    /// Read the next complete packet.
    ///
    /// - [`StreamError::Timeout`]: nothing complete within the read
    ///   timeout; the socket stays open and buffered bytes are kept.
    /// - [`StreamError::ConnectionLost`], [`StreamError::EndOfStream`],
    ///   protocol violations: the socket is closed before returning.
    ///
    /// Cancel-safe: dropping the future keeps partially read bytes in
    /// the codec buffer.
    pub async fn receive_packet(&mut self) -> Result<Packet, StreamError> {
        let framed = self.framed.as_mut().ok_or(StreamError::NotConnected)?;

        let result = match tokio::time::timeout(self.read_timeout, framed.next()).await {
            Err(_) => return Err(StreamError::Timeout(self.read_timeout)),
            Ok(Some(result)) => result,
            Ok(None) => Err(StreamError::ConnectionLost(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "peer closed the connection",
            ))),
        };

        if let Err(e) = &result {
            if e.is_fatal_to_connection() {
                self.close();
            }
        }
        result
    }

    /// Release the socket. Safe to call repeatedly or before connecting.
    pub fn close(&mut self) {
        if self.framed.take().is_some() {
            debug!("closed connection to {}", self.endpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, Endpoint::new(addr.ip().to_string(), addr.port()))
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::new("10.0.0.2", 8554).to_string(), "10.0.0.2:8554");
    }

    #[test]
    fn close_is_idempotent_on_fresh_client() {
        let mut client = StreamClient::new(Endpoint::new("127.0.0.1", 1));
        client.close();
        client.close();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn receive_without_connect_is_not_connected() {
        let mut client = StreamClient::new(Endpoint::new("127.0.0.1", 1));
        let err = client.receive_packet().await.unwrap_err();
        assert!(matches!(err, StreamError::NotConnected));
    }

    #[tokio::test]
    async fn connect_refused_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let (listener, endpoint) = listener().await;
        drop(listener);

        let mut client = StreamClient::new(endpoint);
        let err = client.connect(Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, StreamError::Transport { .. }));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn receives_packet_then_end_of_stream() {
        let (listener, endpoint) = listener().await;
        let peer = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            buf.put_u32(4);
            buf.put_i32(-90);
            buf.extend_from_slice(b"data");
            buf.put_u32(0);
            sock.write_all(&buf).await.unwrap();
            sock
        });

        let mut client = StreamClient::new(endpoint);
        client.connect(Duration::from_secs(2)).await.unwrap();
        assert!(client.is_connected());

        let pkt = client.receive_packet().await.unwrap();
        assert_eq!(pkt.body().as_ref(), b"data");
        assert_eq!(pkt.rotation_degrees(), 270);

        let err = client.receive_packet().await.unwrap_err();
        assert!(matches!(err, StreamError::EndOfStream));
        assert!(!client.is_connected());

        let _sock = peer.await.unwrap();
    }

    #[tokio::test]
    async fn silent_peer_times_out_but_stays_connected() {
        let (listener, endpoint) = listener().await;
        let peer = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            let mut buf = BytesMut::new();
            buf.put_u32(1);
            buf.put_i32(0);
            buf.put_u8(0xaa);
            sock.write_all(&buf).await.unwrap();
            sock
        });

        let mut client =
            StreamClient::new(endpoint).with_read_timeout(Duration::from_millis(100));
        client.connect(Duration::from_secs(2)).await.unwrap();

        let err = client.receive_packet().await.unwrap_err();
        assert!(matches!(err, StreamError::Timeout(_)));
        assert!(client.is_connected());

        // Keep reading until the late packet shows up.
        let pkt = loop {
            match client.receive_packet().await {
                Ok(pkt) => break pkt,
                Err(StreamError::Timeout(_)) => continue,
                Err(e) => panic!("unexpected error: {e}"),
            }
        };
        assert_eq!(pkt.body().as_ref(), &[0xaa]);

        let _sock = peer.await.unwrap();
    }

    #[tokio::test]
    async fn peer_close_mid_body_is_connection_lost() {
        let (listener, endpoint) = listener().await;
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            buf.put_u32(100);
            buf.put_i32(0);
            buf.extend_from_slice(&[1u8; 10]);
            sock.write_all(&buf).await.unwrap();
            // Dropping the socket closes it mid-body.
        });

        let mut client = StreamClient::new(endpoint);
        client.connect(Duration::from_secs(2)).await.unwrap();

        let err = client.receive_packet().await.unwrap_err();
        assert!(matches!(err, StreamError::ConnectionLost(_)));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn oversized_header_is_protocol_violation() {
        let (listener, endpoint) = listener().await;
        let peer = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(&(20_000_001u32).to_be_bytes()).await.unwrap();
            sock
        });

        let mut client = StreamClient::new(endpoint);
        client.connect(Duration::from_secs(2)).await.unwrap();

        let err = client.receive_packet().await.unwrap_err();
        assert!(err.is_protocol_violation());
        assert!(!client.is_connected());

        let _sock = peer.await.unwrap();
    }
}
