//! Orientation correction.

use image::RgbImage;
use image::imageops;

use crate::frame::types::Rotation;

/// Apply `rotation` to `image`, consuming it.
///
/// `Clockwise90` and `CounterClockwise90` are opposite quarter turns;
/// a 270° wire value is one counter-clockwise quarter turn, not three
/// clockwise ones applied separately.
pub fn rotate(image: RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise90 => imageops::rotate90(&image),
        Rotation::Half => imageops::rotate180(&image),
        // rotate270 is 270° clockwise, i.e. 90° counter-clockwise.
        Rotation::CounterClockwise90 => imageops::rotate270(&image),
    }
}
