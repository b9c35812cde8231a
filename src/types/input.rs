//! Raw form input captured for a single prediction request

use crate::error::{RiskError, RiskResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Youngest insurable age accepted by the form
pub const MIN_AGE: u8 = 18;
/// Oldest insurable age accepted by the form
pub const MAX_AGE: u8 = 100;
/// Age pre-filled in the form
pub const DEFAULT_AGE: u8 = 33;

/// Prefix of the one-hot columns produced from the vehicle category
pub const CATEGORY_COLUMN_PREFIX: &str = "cartype_";

/// Driver age, guaranteed to lie in `[MIN_AGE, MAX_AGE]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Age(u8);

impl Age {
    /// Validate a raw age value
    pub fn new(years: i64) -> RiskResult<Self> {
        if (MIN_AGE as i64..=MAX_AGE as i64).contains(&years) {
            Ok(Self(years as u8))
        } else {
            Err(RiskError::AgeOutOfRange(years))
        }
    }

    pub fn years(self) -> u8 {
        self.0
    }
}

impl Default for Age {
    fn default() -> Self {
        Self(DEFAULT_AGE)
    }
}

impl TryFrom<i64> for Age {
    type Error = RiskError;

    fn try_from(years: i64) -> Result<Self, Self::Error> {
        Self::new(years)
    }
}

impl From<Age> for u8 {
    fn from(age: Age) -> Self {
        age.0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vehicle category offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Combi,
    Family,
    Sport,
    Minivan,
}

impl VehicleCategory {
    /// All categories, in the order the form lists them
    pub const ALL: [VehicleCategory; 4] = [
        VehicleCategory::Combi,
        VehicleCategory::Family,
        VehicleCategory::Sport,
        VehicleCategory::Minivan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleCategory::Combi => "combi",
            VehicleCategory::Family => "family",
            VehicleCategory::Sport => "sport",
            VehicleCategory::Minivan => "minivan",
        }
    }

    /// Name of the one-hot column for this category (`cartype_<value>`)
    pub fn column_name(self) -> String {
        format!("{}{}", CATEGORY_COLUMN_PREFIX, self.as_str())
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleCategory {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RiskError::UnknownCategory(s.to_string()))
    }
}

/// User input for one prediction. Immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInput {
    pub age: Age,
    pub vehicle_category: VehicleCategory,
}

impl RawInput {
    pub fn new(age: Age, vehicle_category: VehicleCategory) -> Self {
        Self {
            age,
            vehicle_category,
        }
    }

    /// Build from unvalidated form values
    pub fn parse(age: i64, vehicle_category: &str) -> RiskResult<Self> {
        Ok(Self::new(Age::new(age)?, vehicle_category.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_bounds() {
        assert_eq!(Age::new(18).unwrap().years(), 18);
        assert_eq!(Age::new(100).unwrap().years(), 100);
        assert!(matches!(Age::new(17), Err(RiskError::AgeOutOfRange(17))));
        assert!(matches!(Age::new(101), Err(RiskError::AgeOutOfRange(101))));
        assert!(Age::new(-5).is_err());
        assert_eq!(Age::default().years(), DEFAULT_AGE);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("family".parse::<VehicleCategory>().unwrap(), VehicleCategory::Family);
        assert_eq!(" Sport ".parse::<VehicleCategory>().unwrap(), VehicleCategory::Sport);
        assert!(matches!(
            "truck".parse::<VehicleCategory>(),
            Err(RiskError::UnknownCategory(_))
        ));
        assert_eq!(VehicleCategory::Minivan.column_name(), "cartype_minivan");
    }

    #[test]
    fn test_raw_input_serialization() {
        let input = RawInput::parse(45, "combi").unwrap();

        let json = serde_json::to_string(&input).unwrap();
        assert_eq!(json, r#"{"age":45,"vehicle_category":"combi"}"#);

        let deserialized: RawInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, deserialized);

        assert!(serde_json::from_str::<RawInput>(r#"{"age":12,"vehicle_category":"combi"}"#).is_err());
    }
}
