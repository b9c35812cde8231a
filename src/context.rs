//! Application context built once at startup.
//!
//! Holds everything loaded from the artifact bundle. It is never mutated
//! after construction and is passed by reference to every prediction.

use crate::config::AppConfig;
use crate::error::{RiskError, RiskResult};
use crate::feature_aligner::{AlignedFeatureRow, FeatureAligner, TrainingSchema};
use crate::models::bundle::{BundleManifest, LabelEncoder, MinMaxScaler};
use crate::models::inference::Predictor;
use crate::models::loader::ModelLoader;
use crate::models::registry::{ModelKind, ModelRegistry};
use crate::types::input::RawInput;
use crate::types::prediction::{Prediction, PredictionReport};
use tracing::{debug, info};

/// Loaded artifact plus preprocessing options
pub struct AppContext {
    schema: TrainingSchema,
    registry: ModelRegistry,
    encoder: LabelEncoder,
    scaler: Option<MinMaxScaler>,
    apply_scaler: bool,
    aligner: FeatureAligner,
}

impl AppContext {
    pub fn new(manifest: BundleManifest, registry: ModelRegistry) -> Self {
        Self {
            schema: manifest.schema,
            registry,
            encoder: manifest.label_encoder,
            scaler: manifest.scaler,
            apply_scaler: false,
            aligner: FeatureAligner::new(),
        }
    }

    /// Enable scaling of aligned rows with the bundled scaler
    pub fn with_scaling(mut self, apply_scaler: bool) -> RiskResult<Self> {
        if apply_scaler && self.scaler.is_none() {
            return Err(RiskError::ArtifactLoad(
                "scaling requested but the bundle has no scaler".to_string(),
            ));
        }
        self.apply_scaler = apply_scaler;
        Ok(self)
    }

    /// Load the manifest and all three classifiers.
    ///
    /// Any failure here is fatal for the session.
    pub fn load(config: &AppConfig) -> RiskResult<Self> {
        let manifest = BundleManifest::load(config.manifest_path())?;

        let registry = ModelLoader::with_threads(config.artifact.onnx_threads)
            .and_then(|loader| loader.load_registry(&config.artifact))
            .map_err(|e| RiskError::ArtifactLoad(format!("{:#}", e)))?;

        let context = Self::new(manifest, registry).with_scaling(config.features.apply_scaler)?;

        info!(
            columns = context.schema.len(),
            scaling = context.apply_scaler,
            "Application context ready"
        );

        Ok(context)
    }

    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    /// Row that will be shown to the user and fed to the model
    pub fn prepare(&self, input: &RawInput) -> RiskResult<AlignedFeatureRow> {
        let row = self.aligner.align(input, &self.schema);

        match (&self.scaler, self.apply_scaler) {
            (Some(scaler), true) => scaler.transform(&row),
            _ => Ok(row),
        }
    }

    /// Run the selected classifier on an already prepared row
    pub fn predict(&self, row: &AlignedFeatureRow, model: ModelKind) -> RiskResult<Prediction> {
        let classifier = self.registry.select(model);
        Predictor::new(&self.encoder).predict(classifier, row)
    }

    /// Run the full pipeline: align, select, predict
    pub fn evaluate(&self, input: &RawInput, model: ModelKind) -> RiskResult<PredictionReport> {
        let row = self.prepare(input)?;
        debug!(age = input.age.years(), vehicle = %input.vehicle_category, model = %model, "Evaluating");

        let prediction = self.predict(&row, model)?;

        Ok(PredictionReport::new(*input, row, prediction))
    }

    /// Same as [`evaluate`](Self::evaluate) with a model name from the form
    pub fn evaluate_named(&self, input: &RawInput, model_name: &str) -> RiskResult<PredictionReport> {
        let model = model_name.parse()?;
        self.evaluate(input, model)
    }
}
