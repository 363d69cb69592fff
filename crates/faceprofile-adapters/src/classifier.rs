//! Candle-backed age and gender classifiers.
//!
//! A small CNN over 64x64 RGB face crops with one output head per label
//! bucket. The same architecture serves both classifier kinds; only the
//! label table and the weights differ.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{conv2d, linear, ops::softmax, Conv2d, Conv2dConfig, Linear, VarBuilder};
use tracing::debug;

use faceprofile_core::domain::{ClassifyError, Recognition};
use faceprofile_core::ports::{ClassifierKind, ClassifierSession, InferenceEngine, ModelDescriptor};

/// Input edge length for classifier crops.
pub const INPUT_SIZE: usize = 64;

/// Age bucket labels, in model output order.
pub const AGE_RANGES: &[&str] = &[
    "0-2", "4-6", "8-12", "15-20", "25-32", "38-43", "48-53", "60-100",
];

/// Gender labels, in model output order.
pub const GENDER_RANGES: &[&str] = &["male", "female"];

/// Loads safetensors weights into a `VarBuilder`.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub fn load_weights(path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    debug!("Loading weights from {}", path.display());
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    VarBuilder::from_buffered_safetensors(data, DType::F32, device)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))
}

/// Classifier network: 3 conv blocks with max pooling, 2 FC layers.
///
/// Input: `(1, 3, 64, 64)` in `[0, 1]`. Output: logits, one per label.
struct PortraitNet {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    fc1: Linear,
    fc2: Linear,
}

impl PortraitNet {
    fn new(num_labels: usize, vb: &VarBuilder) -> Result<Self> {
        let pad1 = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };
        let conv1 = conv2d(3, 16, 3, pad1, vb.pp("conv1"))?;
        let conv2 = conv2d(16, 32, 3, pad1, vb.pp("conv2"))?;
        let conv3 = conv2d(32, 64, 3, pad1, vb.pp("conv3"))?;

        // Three 2x2 max pools: 64 -> 32 -> 16 -> 8, flattened 64 * 8 * 8.
        let fc1 = linear(64 * 8 * 8, 128, vb.pp("fc1"))?;
        let fc2 = linear(128, num_labels, vb.pp("fc2"))?;

        Ok(Self {
            conv1,
            conv2,
            conv3,
            fc1,
            fc2,
        })
    }
}

impl Module for PortraitNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(x)?.relu()?.max_pool2d(2)?;
        let x = self.conv2.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = self.conv3.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = x.flatten_from(1)?;
        let x = self.fc1.forward(&x)?.relu()?;
        self.fc2.forward(&x)
    }
}

/// A loaded classifier model bound to a device.
pub struct CandleSession {
    net: PortraitNet,
    labels: &'static [&'static str],
    device: Device,
}

impl CandleSession {
    fn preprocess(&self, image: &image::DynamicImage) -> Result<Tensor> {
        let resized = image.resize_exact(
            INPUT_SIZE as u32,
            INPUT_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );
        let rgb = resized.to_rgb8();
        let data: Vec<f32> = rgb.pixels().flat_map(|p| p.0).map(|c| f32::from(c) / 255.0).collect();

        let tensor = Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?;
        tensor
            .permute((0, 3, 1, 2))
            .context("Failed to preprocess face crop")
    }
}

impl ClassifierSession for CandleSession {
    fn run(&self, image: &image::DynamicImage) -> Result<Vec<Recognition>> {
        let input = self.preprocess(image)?;
        let logits = self.net.forward(&input)?;
        let probs = softmax(&logits, 1)?.squeeze(0)?.to_vec1::<f32>()?;

        let mut recognitions: Vec<Recognition> = self
            .labels
            .iter()
            .zip(probs)
            .map(|(label, confidence)| Recognition {
                label: (*label).to_string(),
                confidence,
            })
            .collect();
        recognitions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(recognitions)
    }
}

/// Inference engine adapter backed by candle.
pub struct CandleEngine {
    device: Device,
}

impl CandleEngine {
    /// Creates an engine bound to a device.
    #[must_use]
    pub const fn new(device: Device) -> Self {
        Self { device }
    }

    /// Creates an engine on the best device this build supports.
    ///
    /// Accelerators that fail to initialize are logged and skipped; the
    /// CPU always works.
    #[must_use]
    pub fn auto() -> Self {
        Self::new(select_device())
    }

    /// The device this engine runs inference on.
    ///
    /// The face detector shares it so all models live on one device.
    #[must_use]
    pub const fn device(&self) -> &Device {
        &self.device
    }

    /// Labels for a classifier kind, in model output order.
    #[must_use]
    pub const fn labels_for(kind: ClassifierKind) -> &'static [&'static str] {
        match kind {
            ClassifierKind::Age => AGE_RANGES,
            ClassifierKind::Gender => GENDER_RANGES,
        }
    }
}

fn select_device() -> Device {
    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            tracing::info!("running inference on cuda:0");
            return device;
        }
        Err(error) => debug!(%error, "cuda device unavailable, falling back"),
    }

    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            tracing::info!("running inference on metal:0");
            return device;
        }
        Err(error) => debug!(%error, "metal device unavailable, falling back"),
    }

    debug!("running inference on the cpu");
    Device::Cpu
}

impl InferenceEngine for CandleEngine {
    fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Box<dyn ClassifierSession>, ClassifyError> {
        let labels = Self::labels_for(descriptor.kind);
        let net = load_weights(&descriptor.path, &self.device)
            .and_then(|vb| PortraitNet::new(labels.len(), &vb))
            .map_err(|e| ClassifyError::ModelLoadFailed(format!("{e:#}")))?;

        Ok(Box::new(CandleSession {
            net,
            labels,
            device: self.device.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_auto_engine_picks_a_usable_device() {
        let engine = CandleEngine::auto();
        #[cfg(not(any(feature = "metal", feature = "cuda")))]
        assert!(matches!(engine.device(), Device::Cpu));
        let _ = engine;
    }

    #[test]
    fn test_label_tables() {
        assert_eq!(CandleEngine::labels_for(ClassifierKind::Age).len(), 8);
        assert_eq!(
            CandleEngine::labels_for(ClassifierKind::Gender),
            &["male", "female"]
        );
    }

    #[test]
    fn test_load_missing_model_fails() {
        let engine = CandleEngine::new(Device::Cpu);
        let result = engine.load(&ModelDescriptor {
            kind: ClassifierKind::Gender,
            path: PathBuf::from("/nonexistent/gender.safetensors"),
        });
        assert!(matches!(result, Err(ClassifyError::ModelLoadFailed(_))));
    }

    #[test]
    fn test_load_corrupt_model_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gender.safetensors");
        std::fs::write(&path, b"not safetensors").expect("write");

        let engine = CandleEngine::new(Device::Cpu);
        let result = engine.load(&ModelDescriptor {
            kind: ClassifierKind::Gender,
            path,
        });
        assert!(matches!(result, Err(ClassifyError::ModelLoadFailed(_))));
    }
}
