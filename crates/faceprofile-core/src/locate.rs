//! Face location and crop geometry.
//!
//! Turns a raw detection (eye midpoint + eye distance) into a crop rect
//! using fixed padding heuristics: the eyes span roughly 25% of the face
//! width and the face width is roughly 75% of the face height. The scale
//! factors are constants of the detection heuristic and are kept exactly
//! for parity with prior behavior, not re-derived.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::domain::{ClassifyError, ClassifyOptions, CropAlgorithm, CropRect, FaceBounds};
use crate::ports::FaceDetector;

/// Eye distance is ~25% of the face width.
const EYES_TO_FACE_WIDTH: f32 = 0.25;
/// Face width is ~75% of the face height.
const FACE_WIDTH_TO_HEIGHT: f32 = 0.75;
/// Crop padding on each axis, in eye distances.
const PADDING_EYE_DISTANCES: f32 = 2.0;

/// Locates a face in an image and derives a well-framed crop around it.
pub struct FaceLocator {
    detector: Arc<dyn FaceDetector>,
}

impl FaceLocator {
    /// Creates a locator over a detector capability.
    #[must_use]
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    /// Finds at most one face in the image.
    ///
    /// Detections implying a face narrower than `options.minimum_face_size`
    /// pixels are discarded. `None` means "no face found" and is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error only when the detector itself fails.
    pub fn locate_face(
        &self,
        image: &DynamicImage,
        options: &ClassifyOptions,
    ) -> anyhow::Result<Option<FaceBounds>> {
        let detections = self.detector.detect(image, 1)?;
        let found = detections
            .into_iter()
            .find(|bounds| bounds.face_width() >= options.minimum_face_size as f32);
        if options.debug_logging {
            match &found {
                Some(bounds) => debug!(
                    midpoint = %format!("({}, {})", bounds.midpoint_x, bounds.midpoint_y),
                    eye_distance = bounds.eye_distance,
                    "face located"
                ),
                None => debug!("no usable face in image"),
            }
        }
        Ok(found)
    }

    /// Extracts the sub-image described by `rect`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the rect extends past the image bounds.
    /// Locator-derived rects never trigger this; the check guards
    /// caller-supplied rectangles.
    pub fn crop(&self, image: &DynamicImage, rect: CropRect) -> Result<DynamicImage, ClassifyError> {
        let (width, height) = image.dimensions();
        rect.validate(width, height)?;
        Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
    }
}

/// Derives the crop rect for a detection within an image of the given
/// dimensions.
///
/// Origin: eye midpoint minus two eye distances per axis, floored at zero.
/// Size: eye distance scaled up to a face box at the requested aspect
/// ratio. Each dimension is clamped independently against the image edge
/// by pinning it to the full extent and then subtracting the overhang, so
/// the origin stays fixed. A zero-area result is legal and means the face
/// sits too close to the edge for a usable crop.
#[must_use]
pub fn compute_crop_rect(
    image_width: u32,
    image_height: u32,
    face: &FaceBounds,
    algorithm: CropAlgorithm,
) -> CropRect {
    let img_w = image_width as f32;
    let img_h = image_height as f32;

    let x_padding = face.eye_distance * PADDING_EYE_DISTANCES;
    let y_padding = face.eye_distance * PADDING_EYE_DISTANCES;

    // Clamping the origin into the image keeps the final invariant intact
    // even for midpoints reported past the image edge; the rect then
    // degenerates to zero size there.
    let start_x = (face.midpoint_x - x_padding).clamp(0.0, img_w);
    let start_y = (face.midpoint_y - y_padding).clamp(0.0, img_h);

    let mut width = face.eye_distance / EYES_TO_FACE_WIDTH;
    let mut height = match algorithm {
        CropAlgorithm::ThreeByFour => width / FACE_WIDTH_TO_HEIGHT,
        CropAlgorithm::Square => width,
    };

    if start_x + width > img_w {
        width = img_w;
        let excess = start_x + width - img_w;
        width -= excess;
    }
    if start_y + height > img_h {
        height = img_h;
        let excess = start_y + height - img_h;
        height -= excess;
    }

    let rect = CropRect::new(
        start_x as u32,
        start_y as u32,
        width.max(0.0) as u32,
        height.max(0.0) as u32,
    );

    // The two clamps run independently; never trust their combination.
    debug_assert!(rect.validate(image_width, image_height).is_ok());
    rect
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    struct ScriptedDetector(Vec<FaceBounds>);

    impl FaceDetector for ScriptedDetector {
        fn detect(
            &self,
            _image: &DynamicImage,
            max_faces: usize,
        ) -> anyhow::Result<Vec<FaceBounds>> {
            Ok(self.0.iter().copied().take(max_faces).collect())
        }
    }

    fn gray(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([128u8])))
    }

    #[test]
    fn test_crop_rect_reference_scenario() {
        // 1200x1600 image, midpoint (600, 500), eye distance 50:
        // padding 100 -> origin (500, 400), size 200 x 266, no clamping.
        let face = FaceBounds::new(600.0, 500.0, 50.0);
        let rect = compute_crop_rect(1200, 1600, &face, CropAlgorithm::ThreeByFour);
        assert_eq!(rect, CropRect::new(500, 400, 200, 266));
    }

    #[test]
    fn test_crop_rect_square_algorithm() {
        let face = FaceBounds::new(600.0, 500.0, 50.0);
        let rect = compute_crop_rect(1200, 1600, &face, CropAlgorithm::Square);
        assert_eq!(rect, CropRect::new(500, 400, 200, 200));
    }

    #[test]
    fn test_crop_rect_origin_floors_at_zero() {
        let face = FaceBounds::new(50.0, 40.0, 60.0);
        let rect = compute_crop_rect(1200, 1600, &face, CropAlgorithm::ThreeByFour);
        assert_eq!((rect.x, rect.y), (0, 0));
    }

    #[test]
    fn test_crop_rect_clamps_to_right_edge() {
        // Origin x = 1100 - 100 = 1000, candidate width 200 overruns 1200
        // by 0 exactly at the edge; push midpoint further right to overrun.
        let face = FaceBounds::new(1150.0, 500.0, 50.0);
        let rect = compute_crop_rect(1200, 1600, &face, CropAlgorithm::ThreeByFour);
        assert_eq!(rect.x, 1050);
        assert_eq!(rect.width, 150);
        assert!(rect.validate(1200, 1600).is_ok());
    }

    #[test]
    fn test_crop_rect_clamps_to_bottom_edge() {
        let face = FaceBounds::new(600.0, 1550.0, 50.0);
        let rect = compute_crop_rect(1200, 1600, &face, CropAlgorithm::ThreeByFour);
        assert_eq!(rect.y, 1450);
        assert_eq!(rect.height, 150);
        assert!(rect.validate(1200, 1600).is_ok());
    }

    #[test]
    fn test_crop_rect_always_inside_bounds() {
        // Sweep midpoints across and beyond the image; the invariant must
        // hold everywhere, including degenerate zero-size rects.
        for mx in (0..1400).step_by(97) {
            for my in (0..1800).step_by(131) {
                let face = FaceBounds::new(mx as f32, my as f32, 45.0);
                let rect = compute_crop_rect(1200, 1600, &face, CropAlgorithm::ThreeByFour);
                assert!(
                    rect.validate(1200, 1600).is_ok(),
                    "rect {rect:?} out of bounds for midpoint ({mx}, {my})"
                );
            }
        }
    }

    #[test]
    fn test_crop_rect_degenerate_at_far_edge() {
        // Midpoint past the bottom-right corner: origin lands on the edge
        // and both dimensions collapse to zero.
        let face = FaceBounds::new(2000.0, 2500.0, 50.0);
        let rect = compute_crop_rect(1200, 1600, &face, CropAlgorithm::ThreeByFour);
        assert!(rect.is_empty());
        assert!(rect.validate(1200, 1600).is_ok());
    }

    #[test]
    fn test_locate_face_filters_small_faces() {
        // Eye distance 10 implies a 40px face, below the 64px minimum.
        let detector = Arc::new(ScriptedDetector(vec![FaceBounds::new(100.0, 100.0, 10.0)]));
        let locator = FaceLocator::new(detector);
        let options = ClassifyOptions {
            minimum_face_size: 64,
            ..ClassifyOptions::default()
        };
        let found = locator
            .locate_face(&gray(300, 400), &options)
            .expect("detector ok");
        assert!(found.is_none());
    }

    #[test]
    fn test_locate_face_none_is_not_an_error() {
        let locator = FaceLocator::new(Arc::new(ScriptedDetector(vec![])));
        let found = locator
            .locate_face(&gray(300, 400), &ClassifyOptions::default())
            .expect("detector ok");
        assert!(found.is_none());
    }

    #[test]
    fn test_crop_extracts_subimage() {
        let locator = FaceLocator::new(Arc::new(ScriptedDetector(vec![])));
        let out = locator
            .crop(&gray(100, 100), CropRect::new(10, 20, 30, 40))
            .expect("crop");
        assert_eq!(out.dimensions(), (30, 40));
    }

    #[test]
    fn test_crop_rejects_out_of_bounds_rect() {
        let locator = FaceLocator::new(Arc::new(ScriptedDetector(vec![])));
        let result = locator.crop(&gray(100, 100), CropRect::new(90, 0, 30, 40));
        assert!(matches!(result, Err(ClassifyError::InvalidInput(_))));
    }
}
