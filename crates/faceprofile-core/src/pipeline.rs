//! Classification pipeline: normalize, validate, classify.
//!
//! One algorithm behind two entry points: [`classify_sync`] blocks the
//! caller, [`classify_async`] runs on a small worker pool and reports
//! through a [`ClassificationSink`]. Inference calls are serialized per
//! lifecycle by the lifecycle's own lock; concurrent async submissions
//! queue on it instead of racing the shared session.
//!
//! [`classify_sync`]: ClassificationPipeline::classify_sync
//! [`classify_async`]: ClassificationPipeline::classify_async

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::Context;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::domain::{
    ClassificationEntry, ClassificationResult, ClassifyError, ClassifyOptions,
};
use crate::lifecycle::ClassifierLifecycle;
use crate::normalize::{force_even_dimensions, resize_to_fit};
use crate::ports::{ClassificationSink, FaceDetector};

/// Working resolution bound, width.
const WORK_MAX_WIDTH: u32 = 300;
/// Working resolution bound, height.
const WORK_MAX_HEIGHT: u32 = 400;
/// Number of background classification workers.
const WORKER_COUNT: usize = 2;

struct Job {
    image: DynamicImage,
    options: ClassifyOptions,
    sink: Arc<dyn ClassificationSink>,
}

/// Orchestrates normalization, face pre-validation and classifier
/// invocation over shared classifier lifecycles.
///
/// The gender classifier is the primary one; an age lifecycle may be
/// attached and runs additionally when `options.classify_age` is set.
pub struct ClassificationPipeline {
    inner: Arc<PipelineInner>,
    queue: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

struct PipelineInner {
    gender: Arc<ClassifierLifecycle>,
    age: Option<Arc<ClassifierLifecycle>>,
    detector: Arc<dyn FaceDetector>,
}

impl ClassificationPipeline {
    /// Creates a pipeline over the given lifecycles and detector and spawns
    /// its worker pool.
    ///
    /// # Errors
    ///
    /// Returns an error when a worker thread cannot be spawned. Workers
    /// already started by then exit with the dropped queue.
    pub fn new(
        gender: Arc<ClassifierLifecycle>,
        age: Option<Arc<ClassifierLifecycle>>,
        detector: Arc<dyn FaceDetector>,
    ) -> anyhow::Result<Self> {
        let inner = Arc::new(PipelineInner {
            gender,
            age,
            detector,
        });

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(WORKER_COUNT);
        for index in 0..WORKER_COUNT {
            let inner = Arc::clone(&inner);
            let receiver = Arc::clone(&receiver);
            let handle = std::thread::Builder::new()
                .name(format!("classify-worker-{index}"))
                .spawn(move || worker_loop(&inner, &receiver))
                .context("Failed to spawn classification worker")?;
            workers.push(handle);
        }

        Ok(Self {
            inner,
            queue: sender,
            workers,
        })
    }

    /// Classifies a face image, blocking the calling thread until the
    /// result is available.
    ///
    /// Do not call this from a context that must stay responsive.
    ///
    /// # Errors
    ///
    /// * `NotInitialized` when a required lifecycle has no loaded model.
    /// * `NoFaceDetected` when `pre_validate_face` is set and the working
    ///   image contains no face (no inference is performed in that case).
    /// * `InvalidInput` for malformed images or failed inference.
    pub fn classify_sync(
        &self,
        image: &DynamicImage,
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.inner.run_classification(image, options)
    }

    /// Submits a classification request to the worker pool.
    ///
    /// Exactly one of `sink.on_result` / `sink.on_error` is invoked per
    /// submission. Requests cannot be cancelled once submitted; completion
    /// order follows inference completion, not submission order.
    pub fn classify_async(
        &self,
        image: DynamicImage,
        options: ClassifyOptions,
        sink: Arc<dyn ClassificationSink>,
    ) {
        let job = Job {
            image,
            options,
            sink,
        };
        if let Err(mpsc::SendError(job)) = self.queue.send(job) {
            // Workers only exit when the pipeline is dropped; a send after
            // that still must honor exactly-once delivery.
            warn!("classification queue closed, failing request");
            job.sink.on_error(ClassifyError::NotInitialized);
        }
    }
}

impl Drop for ClassificationPipeline {
    fn drop(&mut self) {
        // Closing the channel lets workers drain outstanding jobs and exit.
        let (closed, _) = mpsc::channel();
        drop(std::mem::replace(&mut self.queue, closed));
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("classification worker panicked during shutdown");
            }
        }
    }
}

fn worker_loop(inner: &PipelineInner, receiver: &Mutex<mpsc::Receiver<Job>>) {
    loop {
        let job = {
            let guard = receiver
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.recv()
        };
        let Ok(job) = job else {
            return;
        };
        match inner.run_classification(&job.image, &job.options) {
            Ok(result) => job.sink.on_result(result),
            Err(error) => job.sink.on_error(error),
        }
    }
}

impl PipelineInner {
    /// The shared algorithm behind both entry points.
    ///
    /// The presence check runs on the even-dimension-fixed image while
    /// inference runs on the merely resized one. That asymmetry is
    /// deliberate; do not "fix" it, output parity depends on it.
    fn run_classification(
        &self,
        image: &DynamicImage,
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult, ClassifyError> {
        if !self.gender.is_initialized() {
            return Err(ClassifyError::NotInitialized);
        }
        let age = match (options.classify_age, &self.age) {
            (true, Some(age)) => {
                if !age.is_initialized() {
                    return Err(ClassifyError::NotInitialized);
                }
                Some(age)
            }
            _ => None,
        };

        if options.debug_logging {
            debug!("rescaling input for classification");
        }
        let resized = resize_to_fit(image, WORK_MAX_WIDTH, WORK_MAX_HEIGHT)?;
        let fixed = force_even_dimensions(resized.clone());

        if options.pre_validate_face && !self.face_present(&fixed)? {
            return Err(ClassifyError::NoFaceDetected);
        }

        let gender_labels = self.gender.run(&resized)?;
        let Some(top_gender) = gender_labels.first() else {
            return Err(ClassifyError::invalid_input(
                "gender classifier returned no labels",
            ));
        };

        let age_range = match age {
            Some(age) => age.run(&resized)?.first().map(|r| r.label.clone()),
            None => None,
        };

        if options.debug_logging {
            debug!(
                gender = %top_gender.label,
                age = age_range.as_deref().unwrap_or("-"),
                "classification completed"
            );
        }

        Ok(ClassificationResult {
            entries: vec![ClassificationEntry {
                face: resized,
                gender_range: top_gender.label.clone(),
                confidence: top_gender.confidence,
                age_range,
            }],
        })
    }

    fn face_present(&self, image: &DynamicImage) -> Result<bool, ClassifyError> {
        let detections = self
            .detector
            .detect(image, 1)
            .map_err(|e| ClassifyError::invalid_input(format!("face check failed: {e:#}")))?;
        Ok(!detections.is_empty())
    }
}
