//! Error taxonomy for face classification.

use thiserror::Error;

/// Errors surfaced by the classification components.
///
/// `NoFaceDetected` is a valid "nothing found" outcome for detection itself;
/// it only becomes an error when a pipeline run was asked to classify an
/// image that turned out to contain no face.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// Malformed image or rectangle supplied by a caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The image contains no usable face portrait.
    #[error("no face portrait in the given image")]
    NoFaceDetected,

    /// A classification call was made while the lifecycle was not in the
    /// Initialized state.
    #[error("classifier is not initialized")]
    NotInitialized,

    /// The underlying model could not be loaded.
    #[error("failed to load classifier model: {0}")]
    ModelLoadFailed(String),
}

impl ClassifyError {
    /// Shorthand for an `InvalidInput` with a formatted message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ClassifyError::invalid_input("zero height").to_string(),
            "invalid input: zero height"
        );
        assert_eq!(
            ClassifyError::NotInitialized.to_string(),
            "classifier is not initialized"
        );
    }
}
