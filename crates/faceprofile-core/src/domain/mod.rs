//! Core domain types for face classification.

mod error;
mod geometry;
mod options;
mod result;

pub use error::ClassifyError;
pub use geometry::{CropRect, FaceBounds};
pub use options::{ClassifyOptions, CropAlgorithm};
pub use result::{ClassificationEntry, ClassificationResult, PortraitReport, Recognition};
