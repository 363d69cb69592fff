//! Candle-backed single-face detector.
//!
//! A compact CNN regressing a face-presence score and the two eye
//! positions from a 96x96 grayscale input. The pipeline only ever needs
//! the eye midpoint and inter-eye distance, so no bounding-box decoding
//! or NMS is involved.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};
use image::GenericImageView;
use tracing::debug;

use faceprofile_core::domain::FaceBounds;
use faceprofile_core::ports::FaceDetector;

use crate::classifier::load_weights;

/// Input edge length for the detector.
pub const INPUT_SIZE: usize = 96;

/// Presence score threshold below which no face is reported.
const SCORE_THRESHOLD: f32 = 0.6;

/// Sigmoid activation.
#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Eye locator network.
///
/// Output: 5 values, a presence logit followed by left and right eye
/// `(x, y)` in normalized `[0, 1]` input coordinates.
struct EyeLocatorNet {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    fc1: Linear,
    fc2: Linear,
}

impl EyeLocatorNet {
    fn new(vb: &VarBuilder) -> Result<Self> {
        let pad1 = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };
        let conv1 = conv2d(1, 16, 3, pad1, vb.pp("conv1"))?;
        let conv2 = conv2d(16, 32, 3, pad1, vb.pp("conv2"))?;
        let conv3 = conv2d(32, 48, 3, pad1, vb.pp("conv3"))?;

        // Three 2x2 max pools: 96 -> 48 -> 24 -> 12, flattened 48 * 12 * 12.
        let fc1 = linear(48 * 12 * 12, 96, vb.pp("fc1"))?;
        let fc2 = linear(96, 5, vb.pp("fc2"))?;

        Ok(Self {
            conv1,
            conv2,
            conv3,
            fc1,
            fc2,
        })
    }
}

impl Module for EyeLocatorNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(x)?.relu()?.max_pool2d(2)?;
        let x = self.conv2.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = self.conv3.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = x.flatten_from(1)?;
        let x = self.fc1.forward(&x)?.relu()?;
        self.fc2.forward(&x)
    }
}

/// Face detector adapter implementing the core detector port.
pub struct CnnFaceDetector {
    net: EyeLocatorNet,
    device: Device,
}

impl CnnFaceDetector {
    /// Loads the detector weights.
    ///
    /// # Errors
    ///
    /// Returns an error when the weights file is missing or invalid.
    pub fn load(path: &Path, device: Device) -> Result<Self> {
        let vb = load_weights(path, &device)?;
        let net = EyeLocatorNet::new(&vb)?;
        Ok(Self { net, device })
    }

    fn preprocess(&self, image: &image::DynamicImage) -> Result<Tensor> {
        let resized = image.resize_exact(
            INPUT_SIZE as u32,
            INPUT_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );
        let gray = resized.to_luma8();
        let data: Vec<f32> = gray.pixels().map(|p| f32::from(p[0]) / 255.0).collect();

        Tensor::from_vec(data, (1, 1, INPUT_SIZE, INPUT_SIZE), &self.device)
            .context("Failed to build detector input")
    }
}

impl FaceDetector for CnnFaceDetector {
    fn detect(
        &self,
        image: &image::DynamicImage,
        max_faces: usize,
    ) -> Result<Vec<FaceBounds>> {
        if max_faces == 0 {
            return Ok(Vec::new());
        }

        let input = self.preprocess(image)?;
        let output = self.net.forward(&input)?.squeeze(0)?.to_vec1::<f32>()?;

        let score = sigmoid(output[0]);
        if score < SCORE_THRESHOLD {
            debug!(score, "no face above threshold");
            return Ok(Vec::new());
        }

        // Scale normalized eye positions back to image coordinates.
        let (width, height) = image.dimensions();
        let (w, h) = (width as f32, height as f32);
        let left = (output[1].clamp(0.0, 1.0) * w, output[2].clamp(0.0, 1.0) * h);
        let right = (output[3].clamp(0.0, 1.0) * w, output[4].clamp(0.0, 1.0) * h);

        let midpoint_x = (left.0 + right.0) / 2.0;
        let midpoint_y = (left.1 + right.1) / 2.0;
        let eye_distance = ((right.0 - left.0).powi(2) + (right.1 - left.1).powi(2)).sqrt();

        debug!(score, eye_distance, "face detected");
        Ok(vec![FaceBounds::new(midpoint_x, midpoint_y, eye_distance)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(8.0) > 0.999);
        assert!(sigmoid(-8.0) < 0.001);
    }

    #[test]
    fn test_load_missing_weights_fails() {
        assert!(CnnFaceDetector::load(Path::new("/nonexistent/face.safetensors"), Device::Cpu)
            .is_err());
    }
}
