//! Classification options.

use serde::{Deserialize, Serialize};

/// Aspect ratio used when deriving a crop rect from a detection.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropAlgorithm {
    /// Portrait crop with a fixed 3:4 aspect ratio.
    #[default]
    ThreeByFour,
    /// Square crop.
    Square,
}

/// Options recognized by the classification pipeline and face locator.
///
/// Construct with named fields over `Default`:
///
/// ```
/// use faceprofile_core::domain::ClassifyOptions;
///
/// let options = ClassifyOptions {
///     pre_validate_face: true,
///     ..ClassifyOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Crop aspect ratio. Default: 3:4 portrait.
    pub crop_algorithm: CropAlgorithm,
    /// Detections implying a face narrower than this many pixels are
    /// ignored. Default: 1 (keep everything).
    pub minimum_face_size: u32,
    /// Re-run a face presence check on the working image before invoking
    /// the classifier. Default: false.
    pub pre_validate_face: bool,
    /// Emit per-step debug events. Default: false.
    pub debug_logging: bool,
    /// Also run the age classifier when one is attached to the pipeline.
    /// Default: true.
    pub classify_age: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            crop_algorithm: CropAlgorithm::ThreeByFour,
            minimum_face_size: 1,
            pre_validate_face: false,
            debug_logging: false,
            classify_age: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClassifyOptions::default();
        assert_eq!(options.crop_algorithm, CropAlgorithm::ThreeByFour);
        assert_eq!(options.minimum_face_size, 1);
        assert!(!options.pre_validate_face);
        assert!(options.classify_age);
    }
}
