//! Type definitions for the risk classifier

pub mod input;
pub mod prediction;

pub use input::{Age, RawInput, VehicleCategory};
pub use prediction::{Prediction, PredictionReport, RiskLabel};
