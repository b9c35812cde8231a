//! Feature alignment for model inference.
//!
//! The classifiers were fit on a one-hot encoded frame whose column order is
//! recorded in the artifact bundle. This module turns form input into a row
//! with exactly those columns, in that order.

use crate::error::{RiskError, RiskResult};
use crate::types::input::{RawInput, VehicleCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name of the numeric age column
pub const AGE_COLUMN: &str = "age";

/// Ordered column names the classifiers were trained on.
///
/// Always non-empty and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TrainingSchema {
    columns: Vec<String>,
}

impl TrainingSchema {
    pub fn new(columns: Vec<String>) -> RiskResult<Self> {
        if columns.is_empty() {
            return Err(RiskError::InvalidSchema("schema has no columns".to_string()));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.trim().is_empty() {
                return Err(RiskError::InvalidSchema("blank column name".to_string()));
            }
            if !seen.insert(column.as_str()) {
                return Err(RiskError::InvalidSchema(format!(
                    "duplicate column '{}'",
                    column
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

impl TryFrom<Vec<String>> for TrainingSchema {
    type Error = RiskError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<TrainingSchema> for Vec<String> {
    fn from(schema: TrainingSchema) -> Self {
        schema.columns
    }
}

/// A single named value in an aligned row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub value: f32,
}

/// Feature row laid out in training-schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedFeatureRow {
    columns: Vec<FeatureColumn>,
}

impl AlignedFeatureRow {
    pub fn from_pairs(pairs: Vec<(String, f32)>) -> Self {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, value)| FeatureColumn { name, value })
                .collect(),
        }
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Values in column order, ready for a model input tensor
    pub fn values(&self) -> Vec<f32> {
        self.columns.iter().map(|c| c.value).collect()
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Replace the values, keeping the column names
    pub(crate) fn with_values(&self, values: Vec<f32>) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .zip(values)
                .map(|(c, value)| FeatureColumn {
                    name: c.name.clone(),
                    value,
                })
                .collect(),
        }
    }
}

/// Aligns form input with the training schema.
pub struct FeatureAligner;

impl FeatureAligner {
    pub fn new() -> Self {
        Self
    }

    /// Encode the raw input as named columns: `age` plus one `cartype_*`
    /// column per known category, exactly one of them set.
    pub fn encode(&self, raw: &RawInput) -> Vec<(String, f32)> {
        let mut encoded = Vec::with_capacity(1 + VehicleCategory::ALL.len());

        encoded.push((AGE_COLUMN.to_string(), raw.age.years() as f32));

        for category in VehicleCategory::ALL {
            let hot = if category == raw.vehicle_category { 1.0 } else { 0.0 };
            encoded.push((category.column_name(), hot));
        }

        encoded
    }

    /// Build a row with exactly the schema's columns.
    ///
    /// Columns produced by [`encode`](Self::encode) keep their value, every
    /// other schema column is 0. Encoded columns the schema does not know
    /// are dropped.
    pub fn align(&self, raw: &RawInput, schema: &TrainingSchema) -> AlignedFeatureRow {
        let encoded = self.encode(raw);

        let pairs = schema
            .columns()
            .iter()
            .map(|column| {
                let value = encoded
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| *value)
                    .unwrap_or(0.0);
                (column.clone(), value)
            })
            .collect();

        AlignedFeatureRow::from_pairs(pairs)
    }
}

impl Default for FeatureAligner {
    fn default() -> Self {
        Self::new()
    }
}
