//! Classifier invocation and label interpretation

use crate::error::{RiskError, RiskResult};
use crate::feature_aligner::AlignedFeatureRow;
use crate::models::bundle::LabelEncoder;
use crate::models::registry::Classifier;
use crate::types::prediction::Prediction;
use tracing::{debug, error};

/// Runs a selected classifier on an aligned row
pub struct Predictor<'a> {
    /// Used only to report the decoded class name
    encoder: &'a LabelEncoder,
}

impl<'a> Predictor<'a> {
    pub fn new(encoder: &'a LabelEncoder) -> Self {
        Self { encoder }
    }

    /// Run inference.
    ///
    /// Raw code `0` is high risk, anything else low risk. Classifier failures
    /// come back as [`RiskError::Inference`].
    pub fn predict(&self, classifier: &Classifier, row: &AlignedFeatureRow) -> RiskResult<Prediction> {
        let kind = classifier.kind();

        if row.is_empty() {
            return Err(RiskError::Inference {
                model: kind.to_string(),
                message: "feature row is empty".to_string(),
            });
        }

        let code = classifier.handle().predict_raw(row).map_err(|e| {
            error!(model = %kind, error = %e, "Model inference failed");
            RiskError::Inference {
                model: kind.to_string(),
                message: format!("{:#}", e),
            }
        })?;

        let encoded_class = self.encoder.inverse_transform(code).map(str::to_string);
        let prediction = Prediction::new(kind, code).with_encoded_class(encoded_class);

        debug!(
            model = %kind,
            raw_code = code,
            label = prediction.label.as_str(),
            "Inference complete"
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry::tests::{fixed_registry, FailingClassifier, FixedClassifier};
    use crate::models::registry::{ModelKind, ModelRegistry};
    use crate::types::prediction::RiskLabel;

    fn row() -> AlignedFeatureRow {
        AlignedFeatureRow::from_pairs(vec![
            ("age".to_string(), 33.0),
            ("cartype_family".to_string(), 1.0),
        ])
    }

    #[test]
    fn test_code_zero_is_high_risk() {
        let encoder = LabelEncoder::default();
        let predictor = Predictor::new(&encoder);
        let registry = fixed_registry(0, 1, 5);

        let knn = predictor.predict(registry.select(ModelKind::Knn), &row()).unwrap();
        assert_eq!(knn.label, RiskLabel::HighRisk);
        assert_eq!(knn.model, ModelKind::Knn);

        let dt = predictor.predict(registry.select(ModelKind::Dt), &row()).unwrap();
        assert_eq!(dt.label, RiskLabel::LowRisk);

        let nn = predictor.predict(registry.select(ModelKind::Nn), &row()).unwrap();
        assert_eq!(nn.label, RiskLabel::LowRisk);
        assert_eq!(nn.raw_code, 5);
    }

    #[test]
    fn test_encoder_class_is_reported() {
        let encoder = LabelEncoder {
            classes: vec!["high".to_string(), "low".to_string()],
        };
        let predictor = Predictor::new(&encoder);
        let registry = fixed_registry(1, 0, 9);

        let knn = predictor.predict(registry.select(ModelKind::Knn), &row()).unwrap();
        assert_eq!(knn.encoded_class.as_deref(), Some("low"));

        let nn = predictor.predict(registry.select(ModelKind::Nn), &row()).unwrap();
        assert_eq!(nn.encoded_class, None);
        assert_eq!(nn.label, RiskLabel::LowRisk);
    }

    #[test]
    fn test_inference_failure_is_reported() {
        let encoder = LabelEncoder::default();
        let predictor = Predictor::new(&encoder);
        let registry = ModelRegistry::new(
            Box::new(FixedClassifier(0)),
            Box::new(FailingClassifier),
            Box::new(FixedClassifier(0)),
        );

        let err = predictor
            .predict(registry.select(ModelKind::Dt), &row())
            .unwrap_err();
        match err {
            RiskError::Inference { model, message } => {
                assert_eq!(model, "Dt");
                assert!(message.contains("expected 7 features"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // other models remain usable
        assert!(predictor.predict(registry.select(ModelKind::Knn), &row()).is_ok());
    }

    #[test]
    fn test_empty_row_is_rejected() {
        let encoder = LabelEncoder::default();
        let predictor = Predictor::new(&encoder);
        let registry = fixed_registry(0, 0, 0);

        let empty = AlignedFeatureRow::from_pairs(vec![]);
        assert!(matches!(
            predictor.predict(registry.select(ModelKind::Nn), &empty),
            Err(RiskError::Inference { .. })
        ));
    }
}
