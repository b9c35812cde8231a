//! Prediction output data structures

use crate::feature_aligner::AlignedFeatureRow;
use crate::models::registry::ModelKind;
use crate::types::input::RawInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    HighRisk,
    LowRisk,
}

impl RiskLabel {
    /// Map a classifier's raw output code to a label.
    ///
    /// Code `0` is high risk; every other code is low risk.
    pub fn from_code(code: i64) -> Self {
        if code == 0 {
            RiskLabel::HighRisk
        } else {
            RiskLabel::LowRisk
        }
    }

    /// Label shown in the form
    pub fn display_name(self) -> &'static str {
        match self {
            RiskLabel::HighRisk => "Alto Riesgo",
            RiskLabel::LowRisk => "Bajo Riesgo",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLabel::HighRisk => "high_risk",
            RiskLabel::LowRisk => "low_risk",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Output of a single classifier call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Model that produced the prediction
    pub model: ModelKind,
    /// Raw output code returned by the classifier
    pub raw_code: i64,
    /// Interpreted label
    pub label: RiskLabel,
    /// Class name decoded through the label encoder, if it knows the code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_class: Option<String>,
}

impl Prediction {
    pub fn new(model: ModelKind, raw_code: i64) -> Self {
        Self {
            model,
            raw_code,
            label: RiskLabel::from_code(raw_code),
            encoded_class: None,
        }
    }

    pub fn with_encoded_class(mut self, class: Option<String>) -> Self {
        self.encoded_class = class;
        self
    }
}

/// Everything the form renders after a prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Unique report identifier
    pub report_id: String,

    /// Inputs as captured from the form
    pub input: RawInput,

    /// Row sent to the classifier
    pub features: AlignedFeatureRow,

    /// Classifier result
    pub prediction: Prediction,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionReport {
    pub fn new(input: RawInput, features: AlignedFeatureRow, prediction: Prediction) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            input,
            features,
            prediction,
            timestamp: Utc::now(),
        }
    }
}
