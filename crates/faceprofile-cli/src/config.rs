//! Configuration file support.
//!
//! TOML configuration is layered from:
//! - XDG config: `~/.config/faceprofile/config.toml` (lowest priority)
//! - Project-local: `.faceprofile.toml` (searched up the directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Face detection settings.
    pub detection: DetectionConfig,
    /// Classification settings.
    pub classification: ClassificationConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Face detection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum face size in pixels.
    pub minimum_face_size: Option<u32>,
    /// Re-check face presence before classification.
    pub pre_validate: Option<bool>,
    /// Crop aspect: "three_by_four" or "square".
    pub crop_algorithm: Option<String>,
}

/// Classification configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Enable/disable age classification.
    pub age: Option<bool>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
}

impl AppConfig {
    /// Loads configuration from XDG and project-local files.
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and dropped.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validates configuration values.
    fn validate(&self) -> Result<(), String> {
        if let Some(ref algorithm) = self.detection.crop_algorithm {
            if algorithm != "three_by_four" && algorithm != "square" {
                return Err(format!(
                    "detection.crop_algorithm must be 'three_by_four' or 'square', got '{algorithm}'"
                ));
            }
        }
        if let Some(size) = self.detection.minimum_face_size {
            if size == 0 {
                return Err("detection.minimum_face_size must be positive".into());
            }
        }
        if let Some(ref format) = self.output.format {
            if format != "json" && format != "jsonl" {
                return Err(format!("output.format must be 'json' or 'jsonl', got '{format}'"));
            }
        }
        Ok(())
    }

    /// Merges another config into this one; values from `other` win.
    fn merge(&mut self, other: Self) {
        self.detection.minimum_face_size = other
            .detection
            .minimum_face_size
            .or(self.detection.minimum_face_size);
        self.detection.pre_validate = other.detection.pre_validate.or(self.detection.pre_validate);
        self.detection.crop_algorithm = other
            .detection
            .crop_algorithm
            .or_else(|| self.detection.crop_algorithm.take());

        self.classification.age = other.classification.age.or(self.classification.age);

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("faceprofile").join("config.toml"))
}

/// Find project-local config by searching up from the current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let config_path = dir.join(".faceprofile.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }
    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = AppConfig::default();
        assert!(config.detection.minimum_face_size.is_none());
        assert!(config.classification.age.is_none());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[detection]
minimum_face_size = 32
pre_validate = true
crop_algorithm = 'square'

[classification]
age = false

[output]
format = 'json'
pretty = true
";
        let config: AppConfig = toml::from_str(toml).expect("parse config");
        assert_eq!(config.detection.minimum_face_size, Some(32));
        assert_eq!(config.detection.pre_validate, Some(true));
        assert_eq!(config.detection.crop_algorithm.as_deref(), Some("square"));
        assert_eq!(config.classification.age, Some(false));
        assert_eq!(config.output.format.as_deref(), Some("json"));
        assert_eq!(config.output.pretty, Some(true));
    }

    #[test]
    fn test_merge_override_wins() {
        let mut base: AppConfig = toml::from_str(
            r"
[detection]
minimum_face_size = 16

[output]
format = 'jsonl'
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[detection]
minimum_face_size = 48
",
        )
        .expect("parse override");

        base.merge(override_config);
        assert_eq!(base.detection.minimum_face_size, Some(48));
        // Untouched values survive the merge.
        assert_eq!(base.output.format.as_deref(), Some("jsonl"));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[classification]
age = true
",
        )
        .expect("parse base");
        base.merge(AppConfig::default());
        assert_eq!(base.classification.age, Some(true));
    }

    #[test]
    fn test_validate_rejects_bad_crop_algorithm() {
        let mut config = AppConfig::default();
        config.detection.crop_algorithm = Some("golden_ratio".into());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("crop_algorithm"));
    }

    #[test]
    fn test_validate_rejects_zero_face_size() {
        let mut config = AppConfig::default();
        config.detection.minimum_face_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_format() {
        let mut config = AppConfig::default();
        config.output.format = Some("xml".into());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("output.format"));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let toml = r"
[detection
minimum_face_size = 16
";
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
