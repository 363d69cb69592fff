//! Classification pipeline tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;

use faceprofile_core::{
    ClassificationPipeline, ClassifierKind, ClassifierLifecycle, ClassifyError, ClassifyOptions,
    FaceBounds, ModelDescriptor,
};
use faceprofile_test_support::{MockFaceDetector, MockInferenceEngine, MockSink};

fn lifecycle(
    kind: ClassifierKind,
    engine: &Arc<MockInferenceEngine>,
) -> Arc<ClassifierLifecycle> {
    Arc::new(ClassifierLifecycle::new(
        Arc::clone(engine) as Arc<dyn faceprofile_core::InferenceEngine>,
        ModelDescriptor {
            kind,
            path: PathBuf::from("model.safetensors"),
        },
    ))
}

fn face_detector() -> Arc<MockFaceDetector> {
    Arc::new(MockFaceDetector::with_faces(vec![FaceBounds::new(
        150.0, 120.0, 40.0,
    )]))
}

fn face_image() -> DynamicImage {
    DynamicImage::new_rgb8(480, 360)
}

#[test]
fn test_new_reports_spawn_outcome() {
    let engine = Arc::new(MockInferenceEngine::with_label("female"));
    let pipeline = ClassificationPipeline::new(
        lifecycle(ClassifierKind::Gender, &engine),
        None,
        face_detector(),
    );
    assert!(pipeline.is_ok());
}

#[test]
fn test_sync_before_initialize_fails() {
    let engine = Arc::new(MockInferenceEngine::with_label("female"));
    let pipeline = ClassificationPipeline::new(
        lifecycle(ClassifierKind::Gender, &engine),
        None,
        face_detector(),
    )
    .expect("pipeline");
    let result = pipeline.classify_sync(&face_image(), &ClassifyOptions::default());
    assert_eq!(result.err(), Some(ClassifyError::NotInitialized));
}

#[test]
fn test_async_before_initialize_reports_error() {
    let engine = Arc::new(MockInferenceEngine::with_label("female"));
    let pipeline = ClassificationPipeline::new(
        lifecycle(ClassifierKind::Gender, &engine),
        None,
        face_detector(),
    )
    .expect("pipeline");
    let sink = Arc::new(MockSink::new());
    pipeline.classify_async(
        face_image(),
        ClassifyOptions::default(),
        Arc::clone(&sink) as Arc<dyn faceprofile_core::ClassificationSink>,
    );
    let outcomes = sink.wait_for(1);
    assert_eq!(
        outcomes[0].as_ref().err(),
        Some(&ClassifyError::NotInitialized)
    );
}

#[test]
fn test_sync_classifies_gender_and_age() {
    let gender = Arc::new(MockInferenceEngine::with_label("female"));
    let age = Arc::new(MockInferenceEngine::with_label("25-32"));
    let gender_lc = lifecycle(ClassifierKind::Gender, &gender);
    let age_lc = lifecycle(ClassifierKind::Age, &age);
    gender_lc.initialize().expect("gender init");
    age_lc.initialize().expect("age init");

    let pipeline = ClassificationPipeline::new(gender_lc, Some(age_lc), face_detector())
        .expect("pipeline");
    let result = pipeline
        .classify_sync(&face_image(), &ClassifyOptions::default())
        .expect("classify");
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].gender_range, "female");
    assert_eq!(result.entries[0].age_range.as_deref(), Some("25-32"));
    // Inference ran on the resized image, inside the working bounds.
    let face = &result.entries[0].face;
    assert_eq!(face.width(), 300);
    assert_eq!(face.height(), 225);
}

#[test]
fn test_age_skipped_when_disabled() {
    let gender = Arc::new(MockInferenceEngine::with_label("male"));
    let age = Arc::new(MockInferenceEngine::with_label("38-43"));
    let gender_lc = lifecycle(ClassifierKind::Gender, &gender);
    let age_lc = lifecycle(ClassifierKind::Age, &age);
    gender_lc.initialize().expect("gender init");
    age_lc.initialize().expect("age init");

    let pipeline = ClassificationPipeline::new(gender_lc, Some(age_lc), face_detector())
        .expect("pipeline");
    let options = ClassifyOptions {
        classify_age: false,
        ..ClassifyOptions::default()
    };
    let result = pipeline
        .classify_sync(&face_image(), &options)
        .expect("classify");
    assert_eq!(result.entries[0].age_range, None);
    assert_eq!(age.runs(), 0);
}

#[test]
fn test_pre_validate_without_face_skips_inference() {
    let engine = Arc::new(MockInferenceEngine::with_label("female"));
    let gender_lc = lifecycle(ClassifierKind::Gender, &engine);
    gender_lc.initialize().expect("init");

    let detector = Arc::new(MockFaceDetector::empty());
    let pipeline = ClassificationPipeline::new(
        gender_lc,
        None,
        Arc::clone(&detector) as Arc<dyn faceprofile_core::FaceDetector>,
    )
    .expect("pipeline");
    let options = ClassifyOptions {
        pre_validate_face: true,
        ..ClassifyOptions::default()
    };
    let result = pipeline.classify_sync(&face_image(), &options);
    assert_eq!(result.err(), Some(ClassifyError::NoFaceDetected));
    assert_eq!(detector.calls(), 1);
    assert_eq!(engine.runs(), 0);
}

#[test]
fn test_concurrent_async_calls_serialize_on_session() {
    let engine = Arc::new(
        MockInferenceEngine::with_label("female").with_run_delay(Duration::from_millis(40)),
    );
    let gender_lc = lifecycle(ClassifierKind::Gender, &engine);
    gender_lc.initialize().expect("init");

    let pipeline = ClassificationPipeline::new(gender_lc, None, face_detector())
        .expect("pipeline");
    let sink = Arc::new(MockSink::new());
    for _ in 0..4 {
        pipeline.classify_async(
            face_image(),
            ClassifyOptions::default(),
            Arc::clone(&sink) as Arc<dyn faceprofile_core::ClassificationSink>,
        );
    }
    let outcomes = sink.wait_for(4);
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(Result::is_ok));
    assert_eq!(engine.runs(), 4);
    // The shared session must never be entered concurrently.
    assert_eq!(engine.max_in_flight(), 1);
}

#[test]
fn test_drop_drains_outstanding_jobs() {
    let engine = Arc::new(
        MockInferenceEngine::with_label("female").with_run_delay(Duration::from_millis(10)),
    );
    let gender_lc = lifecycle(ClassifierKind::Gender, &engine);
    gender_lc.initialize().expect("init");

    let sink = Arc::new(MockSink::new());
    {
        let pipeline = ClassificationPipeline::new(gender_lc, None, face_detector())
            .expect("pipeline");
        for _ in 0..3 {
            pipeline.classify_async(
                face_image(),
                ClassifyOptions::default(),
                Arc::clone(&sink) as Arc<dyn faceprofile_core::ClassificationSink>,
            );
        }
    }
    // Drop joined the workers, so every submission completed.
    let outcomes = sink.wait_for(3);
    assert_eq!(outcomes.len(), 3);
}
