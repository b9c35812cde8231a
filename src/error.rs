//! Error types for the risk classifier

use thiserror::Error;

use crate::types::input::{MAX_AGE, MIN_AGE};

/// Domain errors surfaced to the user.
///
/// Load and schema errors end the session. Input, model-name and inference
/// errors only abort the current prediction attempt.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Age must be between {min} and {max}, got {0}", min = MIN_AGE, max = MAX_AGE)]
    AgeOutOfRange(i64),

    #[error("Unknown vehicle category: {0}")]
    UnknownCategory(String),

    #[error("Unknown model: {0} (expected one of Knn, Dt, Nn)")]
    UnknownModel(String),

    #[error("Failed to load model artifact: {0}")]
    ArtifactLoad(String),

    #[error("Invalid training schema: {0}")]
    InvalidSchema(String),

    #[error("Inference failed for model {model}: {message}")]
    Inference { model: String, message: String },
}

impl RiskError {
    /// Whether the session can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            RiskError::ArtifactLoad(_) | RiskError::InvalidSchema(_)
        )
    }
}

pub type RiskResult<T> = Result<T, RiskError>;
