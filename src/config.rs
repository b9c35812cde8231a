//! Configuration management for the risk classifier

use crate::models::registry::ModelKind;
use crate::types::input::DEFAULT_AGE;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub artifact: ArtifactConfig,
    pub form: FormConfig,
    pub features: FeatureConfig,
    pub assets: AssetConfig,
    pub logging: LoggingConfig,
}

/// Model artifact location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding the manifest and ONNX files
    pub dir: String,
    /// Manifest file name inside `dir`
    pub manifest: String,
    /// ONNX file names inside `dir`
    pub models: ModelFiles,
    /// Number of threads for ONNX inference per model
    pub onnx_threads: usize,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: "artifact".to_string(),
            manifest: "bundle.json".to_string(),
            models: ModelFiles::default(),
            onnx_threads: 1,
        }
    }
}

/// ONNX file name for each classifier
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelFiles {
    pub knn: String,
    pub dt: String,
    pub nn: String,
}

impl ModelFiles {
    pub fn file_for(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Knn => &self.knn,
            ModelKind::Dt => &self.dt,
            ModelKind::Nn => &self.nn,
        }
    }
}

impl Default for ModelFiles {
    fn default() -> Self {
        Self {
            knn: "knn.onnx".to_string(),
            dt: "decision_tree.onnx".to_string(),
            nn: "neural_network.onnx".to_string(),
        }
    }
}

/// Form defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Age pre-filled in the form
    pub default_age: u8,
    /// Model pre-selected in the form
    pub default_model: ModelKind,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_age: DEFAULT_AGE,
            default_model: ModelKind::Nn,
        }
    }
}

/// Feature preprocessing options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Apply the bundled min-max scaler to aligned rows before inference
    pub apply_scaler: bool,
}

/// Decorative assets
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub logo_path: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            logo_path: "assets/seguro1.jpg".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file, falling back to defaults
    /// when it does not exist
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_path(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Path of the bundle manifest
    pub fn manifest_path(&self) -> std::path::PathBuf {
        Path::new(&self.artifact.dir).join(&self.artifact.manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.artifact.dir, "artifact");
        assert_eq!(config.artifact.models.file_for(ModelKind::Dt), "decision_tree.onnx");
        assert_eq!(config.form.default_age, 33);
        assert_eq!(config.form.default_model, ModelKind::Nn);
        assert!(!config.features.apply_scaler);
        assert_eq!(
            config.manifest_path(),
            Path::new("artifact").join("bundle.json")
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[artifact]
dir = "/opt/risk"

[artifact.models]
nn = "mlp.onnx"

[form]
default_model = "Knn"

[features]
apply_scaler = true
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.artifact.dir, "/opt/risk");
        assert_eq!(config.artifact.manifest, "bundle.json");
        assert_eq!(config.artifact.models.nn, "mlp.onnx");
        assert_eq!(config.artifact.models.knn, "knn.onnx");
        assert_eq!(config.form.default_model, ModelKind::Knn);
        assert_eq!(config.form.default_age, 33);
        assert!(config.features.apply_scaler);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_unknown_default_model_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[form]\ndefault_model = \"Svm\"\n").unwrap();

        assert!(AppConfig::load_from_path(&path).is_err());
    }
}
