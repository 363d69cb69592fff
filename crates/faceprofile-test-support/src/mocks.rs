//! Mock implementations of the core port traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use image::DynamicImage;

use faceprofile_core::domain::{
    ClassificationResult, ClassifyError, FaceBounds, Recognition,
};
use faceprofile_core::ports::{
    ClassificationSink, ClassifierSession, FaceDetector, InferenceEngine, ModelDescriptor,
};

/// Scripted face detector: returns a fixed set of detections and counts
/// invocations.
pub struct MockFaceDetector {
    detections: Vec<FaceBounds>,
    calls: AtomicUsize,
}

impl MockFaceDetector {
    /// Detector that reports the given faces.
    #[must_use]
    pub fn with_faces(detections: Vec<FaceBounds>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }

    /// Detector that never finds a face.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_faces(Vec::new())
    }

    /// Number of `detect` invocations so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceDetector for MockFaceDetector {
    fn detect(&self, _image: &DynamicImage, max_faces: usize) -> anyhow::Result<Vec<FaceBounds>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.iter().copied().take(max_faces).collect())
    }
}

/// Shared counters for a [`MockInferenceEngine`] and its sessions.
#[derive(Default)]
struct EngineCounters {
    loads: AtomicUsize,
    runs: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Mock inference engine whose sessions return a fixed label and track how
/// many calls ever overlap (for single-flight assertions).
pub struct MockInferenceEngine {
    label: String,
    fail_load: bool,
    run_delay: Duration,
    counters: Arc<EngineCounters>,
}

impl MockInferenceEngine {
    /// Engine whose sessions always answer with `label`.
    #[must_use]
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fail_load: false,
            run_delay: Duration::ZERO,
            counters: Arc::default(),
        }
    }

    /// Engine that fails every `load` with `ModelLoadFailed`.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_load: true,
            ..Self::with_label("unused")
        }
    }

    /// Makes each inference call take at least `delay`, so overlap would be
    /// observable.
    #[must_use]
    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// Number of successful or failed `load` calls.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.counters.loads.load(Ordering::SeqCst)
    }

    /// Number of completed inference calls across all sessions.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.counters.runs.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently running inference calls observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

impl InferenceEngine for MockInferenceEngine {
    fn load(
        &self,
        _descriptor: &ModelDescriptor,
    ) -> Result<Box<dyn ClassifierSession>, ClassifyError> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(ClassifyError::ModelLoadFailed("mock load failure".into()));
        }
        Ok(Box::new(MockSession {
            label: self.label.clone(),
            run_delay: self.run_delay,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockSession {
    label: String,
    run_delay: Duration,
    counters: Arc<EngineCounters>,
}

impl ClassifierSession for MockSession {
    fn run(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Recognition>> {
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.run_delay.is_zero() {
            std::thread::sleep(self.run_delay);
        }
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.runs.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Recognition {
            label: self.label.clone(),
            confidence: 0.93,
        }])
    }
}

/// Sink that records outcomes and lets tests block until enough arrived.
#[derive(Default)]
pub struct MockSink {
    outcomes: Mutex<Vec<Result<ClassificationResult, ClassifyError>>>,
    ready: Condvar,
}

impl MockSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until `count` outcomes arrived, with a generous timeout.
    ///
    /// # Panics
    ///
    /// Panics when the timeout elapses first.
    #[must_use]
    pub fn wait_for(&self, count: usize) -> Vec<Result<ClassificationResult, ClassifyError>> {
        let guard = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, timeout) = self
            .ready
            .wait_timeout_while(guard, Duration::from_secs(10), |o| o.len() < count)
            .unwrap_or_else(PoisonError::into_inner);
        assert!(!timeout.timed_out(), "timed out waiting for {count} outcomes");
        guard.clone()
    }

    /// Outcomes recorded so far.
    #[must_use]
    pub fn outcomes(&self) -> Vec<Result<ClassificationResult, ClassifyError>> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, outcome: Result<ClassificationResult, ClassifyError>) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome);
        self.ready.notify_all();
    }
}

impl ClassificationSink for MockSink {
    fn on_result(&self, result: ClassificationResult) {
        self.push(Ok(result));
    }

    fn on_error(&self, error: ClassifyError) {
        self.push(Err(error));
    }
}
