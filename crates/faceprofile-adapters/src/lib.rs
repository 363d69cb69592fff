//! Faceprofile Adapters - concrete implementations of the core ports.
//!
//! Provides filesystem image loading with EXIF orientation correction, a
//! candle-backed face detector and age/gender classifiers, and model
//! download management.

pub mod classifier;
pub mod detector;
pub mod fs;
pub mod models;

pub use classifier::{CandleEngine, AGE_RANGES, GENDER_RANGES};
pub use detector::CnnFaceDetector;
pub use fs::{is_supported_image, load_photo, read_orientation, LoadedPhoto};
pub use models::{
    ensure_model, list_models, model_path, models_dir, set_models_dir, ModelInfo,
    ProgressCallback, MODELS,
};
