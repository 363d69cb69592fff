//! Classify command - estimate age range and gender for faces in photos.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::{debug, info, warn};

use faceprofile_adapters::{
    load_photo, model_path, set_models_dir, CandleEngine, CnnFaceDetector,
};
use faceprofile_core::{
    compute_crop_rect, ClassificationPipeline, ClassifierKind, ClassifierLifecycle,
    ClassifyError, ClassifyOptions, CropAlgorithm, CropRect, FaceLocator, ModelDescriptor,
    PortraitReport,
};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Working resolution the original photo is scaled into before detection.
const PHOTO_MAX_WIDTH: u32 = 480;
const PHOTO_MAX_HEIGHT: u32 = 360;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per face)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Crop aspect ratio choice.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CropChoice {
    /// Portrait 3:4 crop
    ThreeByFour,
    /// Square crop
    Square,
}

impl From<CropChoice> for CropAlgorithm {
    fn from(choice: CropChoice) -> Self {
        match choice {
            CropChoice::ThreeByFour => Self::ThreeByFour,
            CropChoice::Square => Self::Square,
        }
    }
}

/// Shared arguments for face classification.
#[derive(Args, Clone)]
pub struct ClassifyArgs {
    /// Image files to classify
    pub paths: Vec<PathBuf>,

    /// Crop aspect ratio
    #[arg(long, value_enum)]
    pub crop: Option<CropChoice>,

    /// Ignore faces narrower than this many pixels
    #[arg(long, value_name = "PIXELS")]
    pub min_face_size: Option<u32>,

    /// Re-check face presence on the working image before classifying
    #[arg(long)]
    pub pre_validate: bool,

    /// Skip age classification
    #[arg(long)]
    pub no_age: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

impl ClassifyArgs {
    /// Applies configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if args.crop.is_none() {
            args.crop = config
                .detection
                .crop_algorithm
                .as_deref()
                .and_then(|s| match s {
                    "three_by_four" => Some(CropChoice::ThreeByFour),
                    "square" => Some(CropChoice::Square),
                    _ => None,
                });
        }
        args.min_face_size = args.min_face_size.or(config.detection.minimum_face_size);
        if !args.pre_validate {
            args.pre_validate = config.detection.pre_validate.unwrap_or(false);
        }
        if !args.no_age {
            if let Some(age) = config.classification.age {
                args.no_age = !age;
            }
        }
        if args.format.is_none() {
            args.format = config.output.format.as_deref().and_then(|s| match s {
                "json" => Some(OutputFormat::Json),
                "jsonl" => Some(OutputFormat::Jsonl),
                _ => None,
            });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        args
    }

    fn options(&self) -> ClassifyOptions {
        ClassifyOptions {
            crop_algorithm: self.crop.map(CropAlgorithm::from).unwrap_or_default(),
            minimum_face_size: self.min_face_size.unwrap_or(1),
            pre_validate_face: self.pre_validate,
            debug_logging: false,
            classify_age: !self.no_age,
        }
    }
}

/// Result of running the classify command.
pub struct ClassifyResult {
    /// Number of images processed.
    pub processed: usize,
    /// Number of images without a usable face.
    pub faceless: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Runs the classify command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &ClassifyArgs) -> Result<ClassifyResult> {
    info!("Classifying {} image(s)", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    if let Some(ref models_dir) = args.models_dir {
        debug!("Using custom models directory: {}", models_dir.display());
        set_models_dir(Some(models_dir.clone()));
    }

    let engine = Arc::new(CandleEngine::auto());
    let detector = Arc::new(
        CnnFaceDetector::load(&model_path("face"), engine.device().clone())
            .context("Failed to load face detector model")?,
    );

    let gender = Arc::new(ClassifierLifecycle::new(
        Arc::clone(&engine) as Arc<dyn faceprofile_core::InferenceEngine>,
        ModelDescriptor {
            kind: ClassifierKind::Gender,
            path: model_path("gender"),
        },
    ));
    let age = Arc::new(ClassifierLifecycle::new(
        engine,
        ModelDescriptor {
            kind: ClassifierKind::Age,
            path: model_path("age"),
        },
    ));

    gender
        .initialize()
        .context("Failed to initialize gender classifier")?;
    if !args.no_age {
        age.initialize()
            .context("Failed to initialize age classifier")?;
    }

    let locator =
        FaceLocator::new(Arc::clone(&detector) as Arc<dyn faceprofile_core::FaceDetector>);
    let pipeline =
        ClassificationPipeline::new(Arc::clone(&gender), Some(Arc::clone(&age)), detector)
            .context("Failed to start classification workers")?;

    let options = args.options();
    let output = JsonOutput::stdout();
    let mut reports = Vec::new();
    let mut faceless = 0usize;

    for path in &args.paths {
        let report = classify_photo(path, &locator, &pipeline, &options);
        if report.failure.is_some() {
            faceless += 1;
        }
        match args.format.unwrap_or_default() {
            OutputFormat::Jsonl => output.write(&report)?,
            OutputFormat::Json => reports.push(report),
        }
    }

    if let OutputFormat::Json = args.format.unwrap_or_default() {
        output.write_array(&reports, args.pretty)?;
    }
    output.flush()?;

    // Release the shared model sessions before exit.
    gender.dispose();
    age.dispose();

    Ok(ClassifyResult {
        processed: args.paths.len(),
        faceless,
        exit_code: if faceless == 0 {
            ExitCode::Success
        } else {
            ExitCode::NoFace
        },
    })
}

/// Classifies one photo: locate, crop, run both classifiers, build the
/// per-face report. Failures are captured in the report rather than
/// aborting the batch.
fn classify_photo(
    path: &std::path::Path,
    locator: &FaceLocator,
    pipeline: &ClassificationPipeline,
    options: &ClassifyOptions,
) -> PortraitReport {
    let display_path = path.to_string_lossy().into_owned();

    let failed = |reason: String| PortraitReport {
        path: display_path.clone(),
        face_index: 0,
        crop: CropRect::new(0, 0, 0, 0),
        age_range: None,
        gender_range: None,
        failure: Some(reason),
    };

    let photo = match load_photo(path) {
        Ok(photo) => photo,
        Err(e) => return failed(format!("{e:#}")),
    };

    let working =
        match faceprofile_core::resize_to_fit(&photo.image, PHOTO_MAX_WIDTH, PHOTO_MAX_HEIGHT) {
            Ok(working) => working,
            Err(e) => return failed(e.to_string()),
        };

    let face = match locator.locate_face(&working, options) {
        Ok(Some(face)) => face,
        Ok(None) => return failed(ClassifyError::NoFaceDetected.to_string()),
        Err(e) => return failed(format!("{e:#}")),
    };

    let rect = compute_crop_rect(
        working.width(),
        working.height(),
        &face,
        options.crop_algorithm,
    );
    if rect.is_empty() {
        // Face too close to the edge for a usable crop.
        warn!("degenerate crop for {display_path}, treating as no face");
        return failed(ClassifyError::NoFaceDetected.to_string());
    }

    let portrait = match locator.crop(&working, rect) {
        Ok(portrait) => portrait,
        Err(e) => return failed(e.to_string()),
    };

    match pipeline.classify_sync(&portrait, options) {
        Ok(result) => match result.entries.into_iter().next() {
            Some(entry) => PortraitReport {
                path: display_path.clone(),
                face_index: 0,
                crop: rect,
                age_range: entry.age_range,
                gender_range: Some(entry.gender_range),
                failure: None,
            },
            None => failed(ClassifyError::NoFaceDetected.to_string()),
        },
        Err(e) => {
            let mut report = failed(e.to_string());
            report.crop = rect;
            report
        }
    }
}
