//! Artifact bundle manifest: training schema and preprocessing parameters
//! stored next to the ONNX models.

use crate::error::{RiskError, RiskResult};
use crate::feature_aligner::{AlignedFeatureRow, TrainingSchema};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Label encoder fitted on the training target
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelEncoder {
    /// Class names indexed by encoded value
    pub classes: Vec<String>,
}

impl LabelEncoder {
    /// Decode a raw model output to its class name
    pub fn inverse_transform(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }
}

/// Min-max scaler fitted on the training frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f32>,
    pub data_max: Vec<f32>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f32, f32),
}

fn default_feature_range() -> (f32, f32) {
    (0.0, 1.0)
}

impl MinMaxScaler {
    pub fn width(&self) -> usize {
        self.data_min.len()
    }

    /// Scale a row into `feature_range`.
    ///
    /// Columns with a zero training range use a unit denominator.
    pub fn transform(&self, row: &AlignedFeatureRow) -> RiskResult<AlignedFeatureRow> {
        if row.len() != self.width() {
            return Err(RiskError::InvalidSchema(format!(
                "scaler expects {} columns, row has {}",
                self.width(),
                row.len()
            )));
        }

        let (lo, hi) = self.feature_range;
        let scaled = row
            .values()
            .iter()
            .zip(self.data_min.iter().zip(&self.data_max))
            .map(|(&x, (&min, &max))| {
                let range = if max - min == 0.0 { 1.0 } else { max - min };
                (x - min) / range * (hi - lo) + lo
            })
            .collect();

        Ok(row.with_values(scaled))
    }
}

/// Contents of `bundle.json`
#[derive(Debug, Clone, Deserialize)]
pub struct BundleManifest {
    /// Ordered feature columns the models were trained on
    pub schema: TrainingSchema,
    #[serde(default)]
    pub label_encoder: LabelEncoder,
    #[serde(default)]
    pub scaler: Option<MinMaxScaler>,
}

impl BundleManifest {
    /// Read and validate a manifest file
    pub fn load<P: AsRef<Path>>(path: P) -> RiskResult<Self> {
        let path = path.as_ref();

        let raw = fs::read_to_string(path).map_err(|e| {
            RiskError::ArtifactLoad(format!("cannot read {}: {}", path.display(), e))
        })?;

        let manifest = Self::from_json(&raw).map_err(|e| match e {
            RiskError::ArtifactLoad(msg) => {
                RiskError::ArtifactLoad(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        info!(
            path = %path.display(),
            columns = manifest.schema.len(),
            classes = manifest.label_encoder.classes.len(),
            scaler = manifest.scaler.is_some(),
            "Bundle manifest loaded"
        );

        Ok(manifest)
    }

    /// Parse and validate manifest JSON
    pub fn from_json(raw: &str) -> RiskResult<Self> {
        let manifest: Self = serde_json::from_str(raw)
            .map_err(|e| RiskError::ArtifactLoad(format!("malformed manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> RiskResult<()> {
        if let Some(scaler) = &self.scaler {
            if scaler.data_min.len() != scaler.data_max.len() {
                return Err(RiskError::InvalidSchema(format!(
                    "scaler min/max lengths differ ({} vs {})",
                    scaler.data_min.len(),
                    scaler.data_max.len()
                )));
            }
            if scaler.width() != self.schema.len() {
                return Err(RiskError::InvalidSchema(format!(
                    "scaler covers {} columns but schema has {}",
                    scaler.width(),
                    self.schema.len()
                )));
            }
        }

        if self.label_encoder.classes.is_empty() {
            warn!("Bundle has no label encoder classes; predictions will not be decoded");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MANIFEST: &str = r#"{
        "schema": ["age", "cartype_combi", "cartype_family", "cartype_sport", "cartype_minivan"],
        "label_encoder": { "classes": ["high", "low"] },
        "scaler": {
            "data_min": [18, 0, 0, 0, 0],
            "data_max": [98, 1, 1, 1, 1]
        }
    }"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = BundleManifest::from_json(MANIFEST).unwrap();

        assert_eq!(manifest.schema.len(), 5);
        assert_eq!(manifest.label_encoder.inverse_transform(0), Some("high"));
        assert_eq!(manifest.label_encoder.inverse_transform(1), Some("low"));
        assert_eq!(manifest.label_encoder.inverse_transform(2), None);
        assert_eq!(manifest.label_encoder.inverse_transform(-1), None);
        assert_eq!(manifest.scaler.unwrap().feature_range, (0.0, 1.0));
    }

    #[test]
    fn test_optional_sections() {
        let manifest = BundleManifest::from_json(r#"{"schema": ["age"]}"#).unwrap();
        assert!(manifest.scaler.is_none());
        assert!(manifest.label_encoder.classes.is_empty());
    }

    #[test]
    fn test_invalid_manifests() {
        assert!(matches!(
            BundleManifest::from_json("not json"),
            Err(RiskError::ArtifactLoad(_))
        ));
        assert!(BundleManifest::from_json(r#"{"schema": []}"#).is_err());
        assert!(matches!(
            BundleManifest::from_json(
                r#"{"schema": ["age"], "scaler": {"data_min": [0, 0], "data_max": [1, 1]}}"#
            ),
            Err(RiskError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = BundleManifest::load(&path).unwrap();
        assert!(manifest.schema.contains("cartype_family"));

        let missing = BundleManifest::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(RiskError::ArtifactLoad(_))));
    }

    #[test]
    fn test_scaler_transform() {
        let scaler = MinMaxScaler {
            data_min: vec![18.0, 0.0, 5.0],
            data_max: vec![98.0, 1.0, 5.0],
            feature_range: (0.0, 1.0),
        };
        let row = AlignedFeatureRow::from_pairs(vec![
            ("age".to_string(), 58.0),
            ("cartype_sport".to_string(), 1.0),
            ("constant".to_string(), 5.0),
        ]);

        let scaled = scaler.transform(&row).unwrap();

        assert_eq!(scaled.values(), vec![0.5, 1.0, 0.0]);
        assert!(scaled.names().eq(row.names()));

        let short = AlignedFeatureRow::from_pairs(vec![("age".to_string(), 30.0)]);
        assert!(scaler.transform(&short).is_err());
    }
}
