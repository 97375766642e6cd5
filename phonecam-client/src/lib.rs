//! # phonecam-client
//!
//! Runs on the desktop. Connects to the phone's camera server (over
//! Wi-Fi or a USB port forward), keeps the stream alive across drops,
//! forwards composited frames to a raw video device, and watches the
//! preview slot headlessly.

pub mod config;
pub mod preview;
pub mod target;
