//! Faceprofile Core - face crop geometry and classification pipeline.
//!
//! This crate contains the domain types, the deterministic crop-geometry
//! algorithm, image normalization, the classifier lifecycle state machine
//! and the sync/async classification pipeline. External capabilities
//! (face detector, inference engine) are consumed through the [`ports`]
//! traits and provided by adapter crates.

pub mod domain;
pub mod lifecycle;
pub mod locate;
pub mod normalize;
pub mod pipeline;
pub mod ports;

pub use domain::{
    ClassificationEntry, ClassificationResult, ClassifyError, ClassifyOptions, CropAlgorithm,
    CropRect, FaceBounds, PortraitReport, Recognition,
};
pub use lifecycle::ClassifierLifecycle;
pub use locate::{compute_crop_rect, FaceLocator};
pub use normalize::{correct_orientation, force_even_dimensions, resize_to_fit, Orientation};
pub use pipeline::ClassificationPipeline;
pub use ports::{
    ClassificationSink, ClassifierKind, ClassifierSession, FaceDetector, InferenceEngine,
    ModelDescriptor,
};
