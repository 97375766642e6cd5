//! # Frame processing leaves
//!
//! | Module       | Purpose                                         |
//! |--------------|-------------------------------------------------|
//! | `types`      | `Rotation`, `Resolution`, `DecodedFrame`        |
//! | `decoder`    | `FrameCodec` contract + `image`-backed decoder  |
//! | `rotate`     | Quarter-turn orientation correction             |
//! | `compositor` | Aspect-preserving fit onto a fixed canvas       |

pub mod compositor;
pub mod decoder;
pub mod rotate;
pub mod types;

pub use compositor::{Compositor, fit_within};
pub use decoder::{FrameCodec, ImageCodec};
pub use rotate::rotate;
pub use types::{DecodedFrame, Resolution, Rotation, normalize_degrees};
