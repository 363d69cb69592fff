//! Synthetic image builders for testing.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// Builder for synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Uniform gray image, the "no features at all" baseline.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
    }

    /// A crude portrait: skin-tone oval on a dark background with two dark
    /// eye dots at the given midpoint/eye distance. Enough structure for
    /// geometry tests that want to reason about where a face "is".
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn portrait(
        width: u32,
        height: u32,
        midpoint_x: f32,
        midpoint_y: f32,
        eye_distance: f32,
    ) -> DynamicImage {
        let face_w = eye_distance / 0.25;
        let face_h = face_w / 0.75;
        let img = RgbImage::from_fn(width, height, |x, y| {
            let dx = (x as f32 - midpoint_x) / (face_w / 2.0);
            let dy = (y as f32 - midpoint_y) / (face_h / 2.0);
            if dx * dx + dy * dy > 1.0 {
                return Rgb([24u8, 24, 32]);
            }
            let left = ((x as f32 - (midpoint_x - eye_distance / 2.0)).abs() < 2.0
                && (y as f32 - midpoint_y).abs() < 2.0) as u8;
            let right = ((x as f32 - (midpoint_x + eye_distance / 2.0)).abs() < 2.0
                && (y as f32 - midpoint_y).abs() < 2.0) as u8;
            if left + right > 0 {
                Rgb([20u8, 16, 12])
            } else {
                Rgb([222u8, 184, 153])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Image with odd dimensions, for even-dimension fix tests.
    #[must_use]
    pub fn odd_sized(value: u8) -> DynamicImage {
        Self::uniform_gray(301, 227, value)
    }

    /// 1x1 pixel image (edge case).
    #[must_use]
    pub fn single_pixel(value: u8) -> DynamicImage {
        Self::uniform_gray(1, 1, value)
    }
}
