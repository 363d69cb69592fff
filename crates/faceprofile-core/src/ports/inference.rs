//! Inference engine port.

use std::path::PathBuf;

use image::DynamicImage;

use crate::domain::{ClassifyError, Recognition};

/// The classifier kinds the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Age range estimation.
    Age,
    /// Gender range estimation.
    Gender,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Age => write!(f, "age"),
            Self::Gender => write!(f, "gender"),
        }
    }
}

/// Identifies a model the engine should load.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    /// Which classifier this model implements.
    pub kind: ClassifierKind,
    /// Path to the model weights.
    pub path: PathBuf,
}

/// Port for the external ML inference engine.
pub trait InferenceEngine: Send + Sync {
    /// Loads a model and returns a ready-to-run session.
    ///
    /// # Errors
    ///
    /// Returns `ModelLoadFailed` when the model file is missing or corrupt.
    fn load(&self, descriptor: &ModelDescriptor)
        -> Result<Box<dyn ClassifierSession>, ClassifyError>;
}

/// A loaded model bound to its execution device.
///
/// Sessions are not assumed safe for concurrent invocation; the lifecycle
/// serializes calls. Native resources are released on drop.
pub trait ClassifierSession: Send {
    /// Runs inference on a pixel buffer and returns labels ordered
    /// best-first.
    ///
    /// # Errors
    ///
    /// Returns an error when inference fails.
    fn run(&self, image: &DynamicImage) -> anyhow::Result<Vec<Recognition>>;
}
