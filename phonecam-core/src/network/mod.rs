//! TCP transport to the phone.

pub mod client;

pub use client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, Endpoint, StreamClient};
