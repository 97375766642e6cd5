//! # phonecam-core
//!
//! Ingestion core for a phone-as-webcam receiver.
//!
//! The phone streams length-prefixed, rotation-tagged still images over
//! TCP. This crate contains:
//! - **Packet / Codec**: `Packet` and `PacketCodec` for the wire framing via `tokio_util`
//! - **Network**: `StreamClient`, a single-connection reader with connect/read deadlines
//! - **Frame**: decode (`image`), quarter-turn rotation, and aspect-preserving compositing
//! - **Sink**: the `FrameSink` output capability, `NullSink`, and `RawVideoSink`
//! - **Cache**: `LatestFrameCache`, a newest-wins preview slot
//! - **Pipeline**: `FramePipeline`, decode → rotate → publish → composite → sink
//! - **Supervisor**: `StreamHandle`, the reconnecting worker with start/stop lifecycle
//! - **State**: the `ConnectionState` machine
//! - **Error**: `StreamError`, a typed, `thiserror`-based error hierarchy

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod network;
pub mod packet;
pub mod pipeline;
pub mod sink;
pub mod state;
pub mod supervisor;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use cache::LatestFrameCache;
pub use codec::PacketCodec;
pub use config::{DEFAULT_RESET_DELAY, DEFAULT_RETRY_DELAY, DEFAULT_STOP_TIMEOUT, StreamConfig};
pub use error::{Recovery, StreamError};
pub use frame::{
    Compositor, DecodedFrame, FrameCodec, ImageCodec, Resolution, Rotation, fit_within,
    normalize_degrees, rotate,
};
pub use network::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, Endpoint, StreamClient};
pub use packet::{HEADER_LENGTH, MAX_FRAME_BYTES, Packet};
pub use pipeline::{FramePipeline, FrameReport};
pub use sink::{Delivery, FrameSink, NullSink, RawVideoSink};
pub use state::ConnectionState;
pub use supervisor::{FrameStats, StreamHandle};
