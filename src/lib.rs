//! Vehicle Risk Classifier Library
//!
//! Aligns form input (driver age and vehicle category) with the feature
//! schema of three pre-trained classifiers and reports a binary risk label.

pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod feature_aligner;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{RiskError, RiskResult};
pub use feature_aligner::{AlignedFeatureRow, FeatureAligner, TrainingSchema};
pub use models::registry::{Classifier, ModelKind, ModelRegistry};
pub use types::{input::RawInput, prediction::PredictionReport, prediction::RiskLabel};
