//! Image normalization: bounded resize, even-dimension fix, orientation.
//!
//! These steps keep the crop geometry numerically well-behaved and satisfy
//! encoders/detectors that require even dimensions.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use tracing::debug;

use crate::domain::ClassifyError;

/// EXIF orientation of a source image, values 1 through 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 1: upright, no transform needed.
    #[default]
    Normal,
    /// 2: mirrored horizontally.
    MirrorHorizontal,
    /// 3: rotated 180 degrees.
    Rotate180,
    /// 4: mirrored vertically.
    MirrorVertical,
    /// 5: mirrored horizontally then rotated 270 degrees clockwise.
    MirrorHorizontalRotate270,
    /// 6: rotated 90 degrees clockwise.
    Rotate90,
    /// 7: mirrored horizontally then rotated 90 degrees clockwise.
    MirrorHorizontalRotate90,
    /// 8: rotated 270 degrees clockwise.
    Rotate270,
}

impl Orientation {
    /// Maps a raw EXIF orientation tag value to a transform.
    #[must_use]
    pub const fn from_exif(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::MirrorHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::MirrorVertical),
            5 => Some(Self::MirrorHorizontalRotate270),
            6 => Some(Self::Rotate90),
            7 => Some(Self::MirrorHorizontalRotate90),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }
}

/// Resizes an image to fit within `max_width` x `max_height`, preserving
/// aspect ratio.
///
/// The bound that constrains the image decides the branch: a wider-than-tall
/// image keeps `max_width` and derives the height, a taller image keeps
/// `max_height` and derives the width. Output never exceeds the bounds and
/// uses a smooth interpolating filter.
///
/// # Errors
///
/// Returns `InvalidInput` for zero-sized images or zero-sized bounds.
pub fn resize_to_fit(
    image: &DynamicImage,
    max_width: u32,
    max_height: u32,
) -> Result<DynamicImage, ClassifyError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ClassifyError::invalid_input(format!(
            "cannot resize zero-sized image ({width}x{height})"
        )));
    }
    if max_width == 0 || max_height == 0 {
        return Err(ClassifyError::invalid_input(format!(
            "resize bounds must be positive ({max_width}x{max_height})"
        )));
    }

    let ratio_bitmap = width as f32 / height as f32;
    let ratio_max = max_width as f32 / max_height as f32;

    let (final_width, final_height) = if ratio_max > ratio_bitmap {
        ((max_height as f32 * ratio_bitmap).round() as u32, max_height)
    } else {
        (max_width, (max_width as f32 / ratio_bitmap).round() as u32)
    };

    debug!(
        from = %format!("{width}x{height}"),
        to = %format!("{final_width}x{final_height}"),
        "resizing image to working bounds"
    );
    Ok(image.resize_exact(final_width.max(1), final_height.max(1), FilterType::Triangle))
}

/// Bumps odd width/height to the next even value by resampling.
///
/// The adjustment is at most one pixel, so a non-interpolating filter is
/// fine. Images that are already even are returned unchanged. Idempotent.
#[must_use]
pub fn force_even_dimensions(image: DynamicImage) -> DynamicImage {
    let (mut width, mut height) = image.dimensions();
    if width % 2 == 1 {
        width += 1;
    }
    if height % 2 == 1 {
        height += 1;
    }
    if (width, height) == image.dimensions() {
        return image;
    }
    debug!("fixing odd dimensions to {width}x{height}");
    image.resize_exact(width, height, FilterType::Nearest)
}

/// Applies the rotation/mirroring implied by an orientation tag so the
/// result is upright and non-mirrored.
#[must_use]
pub fn correct_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => image,
        Orientation::MirrorHorizontal => image.fliph(),
        Orientation::Rotate180 => image.rotate180(),
        Orientation::MirrorVertical => image.flipv(),
        Orientation::MirrorHorizontalRotate270 => image.fliph().rotate270(),
        Orientation::Rotate90 => image.rotate90(),
        Orientation::MirrorHorizontalRotate90 => image.fliph().rotate90(),
        Orientation::Rotate270 => image.rotate270(),
    }
}
