//! Completion sink port for asynchronous classification.

use crate::domain::{ClassificationResult, ClassifyError};

/// Port for receiving the outcome of an asynchronous classification call.
///
/// For every submitted request exactly one of the two methods is invoked,
/// exactly once, from the pipeline's worker context.
pub trait ClassificationSink: Send + Sync {
    /// Called with the completed result.
    fn on_result(&self, result: ClassificationResult);

    /// Called when the run failed.
    fn on_error(&self, error: ClassifyError);
}
