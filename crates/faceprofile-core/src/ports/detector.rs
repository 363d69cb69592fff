//! Face detector port.

use image::DynamicImage;

use crate::domain::FaceBounds;

/// Port for the external face bounding-box detector.
///
/// A detector reports zero or more faces as eye midpoint + eye distance in
/// the coordinates of the given image. Finding no face is a valid outcome,
/// not an error.
pub trait FaceDetector: Send + Sync {
    /// Detects up to `max_faces` faces in the image.
    ///
    /// # Errors
    ///
    /// Returns an error only when detection itself fails (e.g. inference
    /// error), never for "no face found".
    fn detect(&self, image: &DynamicImage, max_faces: usize) -> anyhow::Result<Vec<FaceBounds>>;
}
