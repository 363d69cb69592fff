//! Classifier lifecycle: load once, reuse, dispose explicitly.

use std::sync::Arc;
use std::sync::Mutex;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::domain::{ClassifyError, Recognition};
use crate::ports::{ClassifierKind, ClassifierSession, InferenceEngine, ModelDescriptor};

enum State {
    Uninitialized,
    Initialized(Box<dyn ClassifierSession>),
    Disposed,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized(_) => "initialized",
            Self::Disposed => "disposed",
        }
    }
}

/// Owns the single live model session for one classifier kind.
///
/// State machine: Uninitialized -> Initialized via [`initialize`], which is
/// idempotent; Initialized -> Disposed via [`dispose`], which releases the
/// model. A disposed lifecycle can be re-initialized and then behaves like a
/// fresh one. Classification in any other state fails with
/// [`ClassifyError::NotInitialized`].
///
/// Concurrency: the session is guarded by a mutex held for the whole
/// inference call, so calls against one lifecycle are single-flight, and a
/// `dispose` racing an in-flight call waits for it to finish rather than
/// pulling the session out from under it.
///
/// [`initialize`]: ClassifierLifecycle::initialize
/// [`dispose`]: ClassifierLifecycle::dispose
pub struct ClassifierLifecycle {
    engine: Arc<dyn InferenceEngine>,
    descriptor: ModelDescriptor,
    state: Mutex<State>,
}

impl ClassifierLifecycle {
    /// Creates a lifecycle in the Uninitialized state.
    #[must_use]
    pub fn new(engine: Arc<dyn InferenceEngine>, descriptor: ModelDescriptor) -> Self {
        Self {
            engine,
            descriptor,
            state: Mutex::new(State::Uninitialized),
        }
    }

    /// The classifier kind this lifecycle manages.
    #[must_use]
    pub const fn kind(&self) -> ClassifierKind {
        self.descriptor.kind
    }

    /// Loads the model if it is not already loaded.
    ///
    /// Calling this while Initialized is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns `ModelLoadFailed` when the engine cannot load the model; the
    /// lifecycle then stays Uninitialized and the caller decides whether to
    /// retry.
    pub fn initialize(&self) -> Result<(), ClassifyError> {
        let mut state = self.lock_state();
        if let State::Initialized(_) = *state {
            debug!(kind = %self.kind(), "classifier already initialized, skipping");
            return Ok(());
        }

        info!(kind = %self.kind(), model = %self.descriptor.path.display(), "initializing classifier");
        match self.engine.load(&self.descriptor) {
            Ok(session) => {
                *state = State::Initialized(session);
                Ok(())
            }
            Err(error) => {
                warn!(kind = %self.kind(), %error, "classifier initialization failed");
                *state = State::Uninitialized;
                Err(error)
            }
        }
    }

    /// Releases the model session and its native resources.
    ///
    /// Safe no-op when nothing is loaded. Waits for an in-flight
    /// classification call before releasing.
    pub fn dispose(&self) {
        let mut state = self.lock_state();
        if let State::Initialized(_) = *state {
            info!(kind = %self.kind(), "disposing classifier and its resources");
        } else {
            debug!(kind = %self.kind(), state = state.name(), "dispose with no live session");
        }
        // Dropping the previous state releases the session.
        *state = State::Disposed;
    }

    /// Returns true while a model session is loaded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(*self.lock_state(), State::Initialized(_))
    }

    /// Runs inference on the shared session.
    ///
    /// Holds the state lock for the duration of the call: single-flight per
    /// lifecycle.
    ///
    /// # Errors
    ///
    /// `NotInitialized` when no session is loaded; `ModelLoadFailed` is
    /// never produced here. Inference failures are reported as
    /// `InvalidInput` with the engine's message.
    pub fn run(&self, image: &DynamicImage) -> Result<Vec<Recognition>, ClassifyError> {
        let state = self.lock_state();
        match &*state {
            State::Initialized(session) => session
                .run(image)
                .map_err(|e| ClassifyError::invalid_input(format!("inference failed: {e:#}"))),
            other => {
                warn!(kind = %self.kind(), state = other.name(), "classification before initialize");
                Err(ClassifyError::NotInitialized)
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
