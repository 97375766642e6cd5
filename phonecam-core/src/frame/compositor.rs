//! Scale-to-fit and centre onto a fixed-size canvas.
//!
//! ```text
//! ┌──────────── target ────────────┐
//! │        zero-filled border      │
//! │   ┌──────── scaled ────────┐   │
//! │   │  aspect-preserving fit │   │
//! │   └────────────────────────┘   │
//! └────────────────────────────────┘
//! ```

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::frame::types::Resolution;

/// Largest size with the source aspect ratio that fits inside `target`.
///
/// Scale factor is `min(W / w, H / h)`; each side is rounded to the
/// nearest pixel and clamped to `1..=target`.
pub fn fit_within(source: Resolution, target: Resolution) -> Resolution {
    if source.is_empty() || target.is_empty() {
        return Resolution::new(0, 0);
    }

    let sx = target.width as f64 / source.width as f64;
    let sy = target.height as f64 / source.height as f64;
    let scale = sx.min(sy);

    let w = (source.width as f64 * scale).round().clamp(1.0, target.width as f64) as u32;
    let h = (source.height as f64 * scale).round().clamp(1.0, target.height as f64) as u32;
    Resolution::new(w, h)
}

/// Builds sink-ready canvases of a fixed resolution.
#[derive(Debug, Clone)]
pub struct Compositor {
    target: Resolution,
    filter: FilterType,
}

impl Compositor {
    /// Bilinear compositor for `target`.
    pub fn new(target: Resolution) -> Self {
        Self {
            target,
            filter: FilterType::Triangle,
        }
    }

    /// Override the resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn target(&self) -> Resolution {
        self.target
    }

    /// Scale `frame` to fit and centre it on a black canvas.
    pub fn compose(&self, frame: &RgbImage) -> RgbImage {
        let mut canvas = RgbImage::new(self.target.width, self.target.height);

        let source = Resolution::new(frame.width(), frame.height());
        let fit = fit_within(source, self.target);
        if fit.is_empty() {
            return canvas;
        }

        let x = i64::from((self.target.width - fit.width) / 2);
        let y = i64::from((self.target.height - fit.height) / 2);

        if fit == source {
            imageops::replace(&mut canvas, frame, x, y);
        } else {
            let scaled = imageops::resize(frame, fit.width, fit.height, self.filter);
            imageops::replace(&mut canvas, &scaled, x, y);
        }
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn fit_preserves_aspect_and_bounds() {
        let targets = [(1920, 1080), (1280, 720), (640, 480), (100, 100), (7, 3)];
        let sources = [(10, 20), (20, 10), (1080, 1920), (4000, 3000), (1, 1), (333, 77)];

        for &(tw, th) in &targets {
            for &(sw, sh) in &sources {
                let t = Resolution::new(tw, th);
                let fit = fit_within(Resolution::new(sw, sh), t);
                assert!(fit.width <= tw && fit.height <= th, "{sw}x{sh} in {t} -> {fit}");
                assert!(fit.width >= 1 && fit.height >= 1);
                // One side touches the target edge.
                assert!(fit.width == tw || fit.height == th, "{sw}x{sh} in {t} -> {fit}");

                // Aspect ratio holds within one pixel of rounding on the short side.
                let expected_h = fit.width as f64 * sh as f64 / sw as f64;
                let expected_w = fit.height as f64 * sw as f64 / sh as f64;
                assert!(
                    (fit.height as f64 - expected_h).abs() <= 1.0
                        || (fit.width as f64 - expected_w).abs() <= 1.0,
                    "{sw}x{sh} in {t} -> {fit}"
                );
            }
        }
    }

    #[test]
    fn portrait_into_landscape() {
        let fit = fit_within(Resolution::new(1080, 1920), Resolution::new(1920, 1080));
        assert_eq!(fit, Resolution::new(608, 1080));
    }

    #[test]
    fn empty_source_yields_empty_fit() {
        let fit = fit_within(Resolution::new(0, 5), Resolution::new(10, 10));
        assert!(fit.is_empty());
    }

    #[test]
    fn compose_centres_on_black() {
        let frame = RgbImage::from_pixel(10, 20, Rgb([255, 0, 0]));
        let canvas = Compositor::new(Resolution::new(40, 20)).compose(&frame);

        assert_eq!((canvas.width(), canvas.height()), (40, 20));
        // 10x20 fits as 10x20, centred at x = 15.
        assert_eq!(canvas.get_pixel(0, 10).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(14, 10).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(15, 0).0, [255, 0, 0]);
        assert_eq!(canvas.get_pixel(24, 19).0, [255, 0, 0]);
        assert_eq!(canvas.get_pixel(25, 10).0, [0, 0, 0]);
    }

    #[test]
    fn compose_scales_up() {
        let frame = RgbImage::from_pixel(4, 2, Rgb([0, 255, 0]));
        let canvas = Compositor::new(Resolution::new(16, 16)).compose(&frame);

        assert_eq!((canvas.width(), canvas.height()), (16, 16));
        // Scaled to 16x8, centred vertically at y = 4.
        assert_eq!(canvas.get_pixel(8, 2).0, [0, 0, 0]);
        let inside = canvas.get_pixel(8, 8).0;
        assert!(inside[0] == 0 && inside[1] > 200 && inside[2] == 0);
        assert_eq!(canvas.get_pixel(8, 13).0, [0, 0, 0]);
    }
}
