//! Trained model artifact: classifiers, schema and preprocessing

pub mod bundle;
pub mod inference;
pub mod loader;
pub mod registry;

pub use bundle::{BundleManifest, LabelEncoder, MinMaxScaler};
pub use inference::Predictor;
pub use loader::ModelLoader;
pub use registry::{Classifier, ModelKind, ModelRegistry, RawClassifier};
