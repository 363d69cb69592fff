//! Model download and cache management.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Placeholder checksum indicating verification should be skipped.
const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Progress callback: `(model name, bytes downloaded, total bytes)`.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Download URL.
    pub url: &'static str,
    /// Expected SHA256 hash; all zeros skips verification.
    pub sha256: &'static str,
    /// Filename in the models directory.
    pub filename: &'static str,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "face",
        url: "https://github.com/faceprofile/faceprofile/releases/download/models-v1/face.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "face.safetensors",
    },
    ModelInfo {
        name: "gender",
        url: "https://github.com/faceprofile/faceprofile/releases/download/models-v1/gender.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "gender.safetensors",
    },
    ModelInfo {
        name: "age",
        url: "https://github.com/faceprofile/faceprofile/releases/download/models-v1/age.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "age.safetensors",
    },
];

static MODELS_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Overrides the models directory for this process (None restores the
/// default).
pub fn set_models_dir(dir: Option<PathBuf>) {
    *MODELS_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = dir;
}

/// Returns the models directory path.
///
/// Defaults to `<data dir>/faceprofile/models` unless overridden.
#[must_use]
pub fn models_dir() -> PathBuf {
    if let Some(dir) = MODELS_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
    {
        return dir;
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faceprofile")
        .join("models")
}

/// Returns the on-disk path for a known model.
#[must_use]
pub fn model_path(name: &str) -> PathBuf {
    let filename = MODELS
        .iter()
        .find(|m| m.name == name)
        .map_or_else(|| format!("{name}.safetensors"), |m| m.filename.to_string());
    models_dir().join(filename)
}

/// Lists known models and whether each is installed.
#[must_use]
pub fn list_models() -> Vec<(&'static str, bool)> {
    let dir = models_dir();
    MODELS
        .iter()
        .map(|m| (m.name, dir.join(m.filename).exists()))
        .collect()
}

/// Ensures one known model's weights are present, downloading when missing.
///
/// # Errors
///
/// Fails for unknown model names, and when the directory cannot be
/// created, the download fails, or the checksum mismatches.
pub fn ensure_model(name: &str, progress: Option<&ProgressCallback>) -> Result<()> {
    let model = MODELS
        .iter()
        .find(|m| m.name == name)
        .ok_or_else(|| anyhow::anyhow!("Unknown model '{name}'"))?;

    let dir = models_dir();
    fs::create_dir_all(&dir).context("Failed to create models directory")?;

    let path = dir.join(model.filename);
    if path.exists() {
        debug!("Model {} already present", model.name);
        return Ok(());
    }
    download_model(model, &path, progress)
}

fn download_model(
    model: &ModelInfo,
    path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<()> {
    info!("Downloading model: {}", model.name);

    let response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;
    if !response.status().is_success() {
        anyhow::bail!("Download of {} failed with status {}", model.name, response.status());
    }

    let total = response.content_length();
    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read response for {}", model.name))?;
    if let Some(callback) = progress {
        callback(model.name, bytes.len() as u64, total);
    }

    verify_checksum(model, &bytes)?;

    fs::write(path, &bytes)
        .with_context(|| format!("Failed to write model to {}", path.display()))?;
    info!("Installed {} ({} bytes)", model.name, bytes.len());
    Ok(())
}

fn verify_checksum(model: &ModelInfo, bytes: &[u8]) -> Result<()> {
    if model.sha256 == PLACEHOLDER_CHECKSUM {
        debug!("Skipping checksum verification for {}", model.name);
        return Ok(());
    }

    let digest = Sha256::digest(bytes);
    let actual = format!("{digest:x}");
    if actual != model.sha256 {
        anyhow::bail!(
            "Checksum mismatch for {}: expected {}, got {actual}",
            model.name,
            model.sha256
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path_for_known_model() {
        assert!(model_path("gender").ends_with("gender.safetensors"));
    }

    #[test]
    fn test_model_path_for_unknown_model() {
        assert!(model_path("other").ends_with("other.safetensors"));
    }

    #[test]
    fn test_ensure_model_unknown_name() {
        let err = ensure_model("sharpen", None).expect_err("unknown model");
        assert!(err.to_string().contains("Unknown model"));
    }

    #[test]
    fn test_ensure_model_present_skips_download() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("face.safetensors"), b"stub").expect("write");
        set_models_dir(Some(dir.path().to_path_buf()));
        // "face" already exists, so no network access happens.
        let result = ensure_model("face", None);
        set_models_dir(None);
        result.expect("present model needs no download");
    }

    #[test]
    fn test_verify_checksum_mismatch() {
        let model = ModelInfo {
            name: "test",
            url: "http://localhost/test",
            sha256: "deadbeef00000000000000000000000000000000000000000000000000000000",
            filename: "test.safetensors",
        };
        assert!(verify_checksum(&model, b"payload").is_err());
    }

    #[test]
    fn test_verify_checksum_placeholder_skips() {
        let model = ModelInfo {
            name: "test",
            url: "http://localhost/test",
            sha256: PLACEHOLDER_CHECKSUM,
            filename: "test.safetensors",
        };
        assert!(verify_checksum(&model, b"anything").is_ok());
    }
}
