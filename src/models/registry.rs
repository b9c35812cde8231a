//! Closed registry of the three trained classifiers

use crate::error::RiskError;
use crate::feature_aligner::AlignedFeatureRow;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anything that can turn an aligned row into a raw class code.
///
/// Implemented by ONNX sessions in production and by fakes in tests.
pub trait RawClassifier: Send + Sync {
    fn predict_raw(&self, row: &AlignedFeatureRow) -> Result<i64>;
}

/// Classifier kinds offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// k-nearest neighbours
    Knn,
    /// Decision tree
    Dt,
    /// Neural network
    Nn,
}

impl ModelKind {
    /// All kinds, in the order the form lists them
    pub const ALL: [ModelKind; 3] = [ModelKind::Nn, ModelKind::Knn, ModelKind::Dt];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Knn => "Knn",
            ModelKind::Dt => "Dt",
            ModelKind::Nn => "Nn",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ModelKind::Knn => "k-nearest neighbours",
            ModelKind::Dt => "decision tree",
            ModelKind::Nn => "neural network",
        }
    }

    /// Entry shown in the form's model picker
    pub fn menu_label(self) -> String {
        format!("{} ({})", self.as_str(), self.description())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = RiskError;

    /// Names are matched exactly: `Knn`, `Dt` or `Nn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Knn" => Ok(ModelKind::Knn),
            "Dt" => Ok(ModelKind::Dt),
            "Nn" => Ok(ModelKind::Nn),
            other => Err(RiskError::UnknownModel(other.to_string())),
        }
    }
}

/// A loaded classifier tagged with its kind
pub enum Classifier {
    Knn(Box<dyn RawClassifier>),
    Dt(Box<dyn RawClassifier>),
    Nn(Box<dyn RawClassifier>),
}

impl Classifier {
    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::Knn(_) => ModelKind::Knn,
            Classifier::Dt(_) => ModelKind::Dt,
            Classifier::Nn(_) => ModelKind::Nn,
        }
    }

    pub fn handle(&self) -> &dyn RawClassifier {
        match self {
            Classifier::Knn(h) | Classifier::Dt(h) | Classifier::Nn(h) => h.as_ref(),
        }
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Classifier").field(&self.kind()).finish()
    }
}

/// The three pre-loaded classifiers
pub struct ModelRegistry {
    knn: Classifier,
    dt: Classifier,
    nn: Classifier,
}

impl ModelRegistry {
    pub fn new(
        knn: Box<dyn RawClassifier>,
        dt: Box<dyn RawClassifier>,
        nn: Box<dyn RawClassifier>,
    ) -> Self {
        Self {
            knn: Classifier::Knn(knn),
            dt: Classifier::Dt(dt),
            nn: Classifier::Nn(nn),
        }
    }

    /// Look up a classifier by kind
    pub fn select(&self, kind: ModelKind) -> &Classifier {
        match kind {
            ModelKind::Knn => &self.knn,
            ModelKind::Dt => &self.dt,
            ModelKind::Nn => &self.nn,
        }
    }

    /// Look up a classifier by its form name
    pub fn select_by_name(&self, name: &str) -> Result<&Classifier, RiskError> {
        Ok(self.select(name.parse()?))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::bail;

    /// Returns a fixed code for every row
    pub(crate) struct FixedClassifier(pub i64);

    impl RawClassifier for FixedClassifier {
        fn predict_raw(&self, _row: &AlignedFeatureRow) -> Result<i64> {
            Ok(self.0)
        }
    }

    /// Rejects every row
    pub(crate) struct FailingClassifier;

    impl RawClassifier for FailingClassifier {
        fn predict_raw(&self, row: &AlignedFeatureRow) -> Result<i64> {
            bail!("expected 7 features, got {}", row.len())
        }
    }

    pub(crate) fn fixed_registry(knn: i64, dt: i64, nn: i64) -> ModelRegistry {
        ModelRegistry::new(
            Box::new(FixedClassifier(knn)),
            Box::new(FixedClassifier(dt)),
            Box::new(FixedClassifier(nn)),
        )
    }

    #[test]
    fn test_parse_model_kind() {
        assert_eq!("Knn".parse::<ModelKind>().unwrap(), ModelKind::Knn);
        assert_eq!("Dt".parse::<ModelKind>().unwrap(), ModelKind::Dt);
        assert_eq!("Nn".parse::<ModelKind>().unwrap(), ModelKind::Nn);

        for bad in ["knn", "Svm", "", "Tree"] {
            assert!(matches!(
                bad.parse::<ModelKind>(),
                Err(RiskError::UnknownModel(name)) if name == bad
            ));
        }
    }

    #[test]
    fn test_select_returns_matching_variant() {
        let registry = fixed_registry(0, 1, 2);

        for kind in ModelKind::ALL {
            assert_eq!(registry.select(kind).kind(), kind);
        }

        let row = AlignedFeatureRow::from_pairs(vec![("age".to_string(), 40.0)]);
        let dt = registry.select_by_name("Dt").unwrap();
        assert!(matches!(dt, Classifier::Dt(_)));
        assert_eq!(dt.handle().predict_raw(&row).unwrap(), 1);
    }

    #[test]
    fn test_select_unknown_name() {
        let registry = fixed_registry(0, 0, 0);
        assert!(matches!(
            registry.select_by_name("Forest"),
            Err(RiskError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_form_order() {
        let names: Vec<&str> = ModelKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["Nn", "Knn", "Dt"]);

        let labels: Vec<String> = ModelKind::ALL.iter().map(|k| k.menu_label()).collect();
        assert_eq!(
            labels,
            vec!["Nn (neural network)", "Knn (k-nearest neighbours)", "Dt (decision tree)"]
        );
    }
}
