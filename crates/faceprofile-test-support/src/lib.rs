//! Shared test support: synthetic images and mock port implementations.

mod builders;
mod mocks;

pub use builders::SyntheticImageBuilder;
pub use mocks::{MockFaceDetector, MockInferenceEngine, MockSink};
