//! Classification result types.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::CropRect;

/// A single classifier label with its confidence, ordered best-first by the
/// session that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Label text, e.g. "female" or "25-32".
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

/// One classified face portrait.
#[derive(Debug, Clone)]
pub struct ClassificationEntry {
    /// The cropped face image the labels refer to.
    pub face: DynamicImage,
    /// Gender range label.
    pub gender_range: String,
    /// Gender label confidence.
    pub confidence: f32,
    /// Age range label, present when age classification ran.
    pub age_range: Option<String>,
}

/// Result of one pipeline run: entries in detection order.
///
/// An empty entry list is a valid result ("zero faces"); a failed run never
/// yields partial entries.
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    /// Per-face entries.
    pub entries: Vec<ClassificationEntry>,
}

impl ClassificationResult {
    /// Returns true when no faces were classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serializable per-face record assembled by the orchestrating caller, one
/// per detected portrait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortraitReport {
    /// Source image path.
    pub path: String,
    /// Index of the face within the image (detection order).
    pub face_index: usize,
    /// Crop rect in working-image coordinates.
    pub crop: CropRect,
    /// Age range label, when classified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    /// Gender range label, when classified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_range: Option<String>,
    /// Failure reason when classification did not complete for this face.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}
