//! ONNX model loader

use crate::config::ArtifactConfig;
use crate::feature_aligner::AlignedFeatureRow;
use crate::models::registry::{ModelKind, ModelRegistry, RawClassifier};
use anyhow::{anyhow, bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Loaded ONNX classifier with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session (wrapped in RwLock because `run` needs `&mut`)
    session: RwLock<Session>,
    /// Input name for the model
    pub input_name: String,
    /// Output carrying the predicted class
    pub label_name: String,
}

impl RawClassifier for LoadedModel {
    fn predict_raw(&self, row: &AlignedFeatureRow) -> Result<i64> {
        let features = row.values();

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(&self.label_name)
            .ok_or_else(|| anyhow!("Model {} produced no '{}' output", self.name, self.label_name))?;

        // sklearn exports emit an int64 label tensor
        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            let code = *data
                .first()
                .ok_or_else(|| anyhow!("Model {} returned an empty label", self.name))?;
            debug!(model = %self.name, code = code, "Extracted label");
            return Ok(code);
        }

        // Networks exported without a label head emit class scores
        let (shape, scores) = output
            .try_extract_tensor::<f32>()
            .context(format!("Model {} output is neither labels nor scores", self.name))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let code = code_from_scores(&dims, scores)
            .with_context(|| format!("Model {} returned unusable scores", self.name))?;

        debug!(model = %self.name, code = code, "Extracted label from scores");
        Ok(code)
    }
}

/// Turn a score tensor for a single row into a class code.
///
/// One column is read as the probability of class 1; two or more columns
/// are per-class scores and the highest wins.
pub fn code_from_scores(dims: &[i64], data: &[f32]) -> Result<i64> {
    let num_classes = match dims {
        [_, classes] | [classes] => usize::try_from(*classes).unwrap_or(data.len()),
        _ => data.len(),
    };

    match num_classes {
        0 => bail!("score tensor has no columns (shape {:?})", dims),
        1 => {
            let p = *data.first().ok_or_else(|| anyhow!("score tensor is empty"))?;
            if !p.is_finite() {
                bail!("score {} is not a probability", p);
            }
            Ok((p >= 0.5) as i64)
        }
        n => {
            let row = data
                .get(..n)
                .ok_or_else(|| anyhow!("expected {} scores, got {}", n, data.len()))?;
            row.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(idx, _)| idx as i64)
                .ok_or_else(|| anyhow!("score tensor is empty"))
        }
    }
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();

        if !path.exists() {
            bail!("Model file not found: {}", path.display());
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_label".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %label_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session: RwLock::new(session),
            input_name,
            label_name,
        })
    }

    /// Load all three classifiers named in the artifact configuration.
    ///
    /// Every model is required; a missing or unreadable file fails the load.
    pub fn load_registry(&self, artifact: &ArtifactConfig) -> Result<ModelRegistry> {
        let dir = Path::new(&artifact.dir);

        let load = |kind: ModelKind| -> Result<Box<dyn RawClassifier>> {
            let file = artifact.models.file_for(kind);
            let model = self.load_model(dir.join(file), kind.as_str())?;
            Ok(Box::new(model))
        };

        let registry = ModelRegistry::new(
            load(ModelKind::Knn)?,
            load(ModelKind::Dt)?,
            load(ModelKind::Nn)?,
        );

        info!(dir = %dir.display(), "Loaded 3 classifiers");

        Ok(registry)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}
