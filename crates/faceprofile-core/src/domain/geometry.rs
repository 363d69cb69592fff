//! Face and crop geometry primitives.

use serde::{Deserialize, Serialize};

use super::ClassifyError;

/// A single face detection: midpoint between the eyes and the inter-eye
/// distance, both in image-space coordinates of the detected image.
///
/// The eye distance is the detector's proxy for face scale; all crop
/// geometry is derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBounds {
    /// Midpoint between the eyes, x coordinate.
    pub midpoint_x: f32,
    /// Midpoint between the eyes, y coordinate.
    pub midpoint_y: f32,
    /// Distance between the eyes in pixels.
    pub eye_distance: f32,
}

impl FaceBounds {
    /// Creates face bounds from an eye midpoint and eye distance.
    #[must_use]
    pub const fn new(midpoint_x: f32, midpoint_y: f32, eye_distance: f32) -> Self {
        Self {
            midpoint_x,
            midpoint_y,
            eye_distance,
        }
    }

    /// Approximate face width implied by the eye distance
    /// (eyes span roughly a quarter of the face width).
    #[must_use]
    pub fn face_width(&self) -> f32 {
        self.eye_distance / 0.25
    }
}

/// An axis-aligned crop region inside an image.
///
/// Invariant: `x + width <= image_width` and `y + height <= image_height`
/// for the image the rect was derived from. Zero-area rects are legal and
/// mean "face too close to the edge, unusable crop".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CropRect {
    /// Creates a crop rect without bounds validation.
    ///
    /// Locator output upholds the invariant by construction; caller-supplied
    /// rects are validated at the crop boundary instead.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true when the rect has no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Validates the rect against the dimensions of the image it will be
    /// applied to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the rect extends past the image bounds.
    pub fn validate(&self, image_width: u32, image_height: u32) -> Result<(), ClassifyError> {
        let x_end = self
            .x
            .checked_add(self.width)
            .ok_or_else(|| ClassifyError::invalid_input("crop rect width overflows"))?;
        let y_end = self
            .y
            .checked_add(self.height)
            .ok_or_else(|| ClassifyError::invalid_input("crop rect height overflows"))?;

        if x_end > image_width || y_end > image_height {
            return Err(ClassifyError::invalid_input(format!(
                "crop rect {}x{}+{}+{} exceeds image bounds {image_width}x{image_height}",
                self.width, self.height, self.x, self.y
            )));
        }
        Ok(())
    }
}
