//! Port definitions for the capabilities the core consumes.
//!
//! These traits define the boundaries between the classification core and
//! external adapters (detector, inference engine, metadata sources).

mod detector;
mod inference;
mod sink;

pub use detector::FaceDetector;
pub use inference::{ClassifierKind, ClassifierSession, InferenceEngine, ModelDescriptor};
pub use sink::ClassificationSink;
