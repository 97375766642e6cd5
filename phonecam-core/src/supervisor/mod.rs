//! # Reconnect supervisor
//!
//! One Tokio task per stream drives a [`crate::network::StreamClient`]
//! through connect → read → fail → backoff, feeding every packet into a
//! [`crate::pipeline::FramePipeline`]. The owner only sees a
//! [`StreamHandle`]: start, request a stop, wait for the stop, and read
//! the preview cache, connection state and statistics.
//!
//! | Module   | Purpose                                       |
//! |----------|-----------------------------------------------|
//! | `handle` | Owner-side lifecycle (`start` / `request_stop` / `await_stopped`) |
//! | `worker` | The connect/read/backoff loop                 |
//! | `stats`  | `FrameStats` published over a watch channel   |

mod handle;
mod stats;
mod worker;

pub use handle::StreamHandle;
pub use stats::FrameStats;
