//! Domain identifier types with validation
//!
//! Newtype wrappers for indicator and encounter identifiers. Each type keeps
//! the two kinds of identifier from being mixed up and normalises its input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient Safety Indicator identifier
///
/// Always held in the canonical `PSI_NN` form. Accepts `PSI_03`, `psi03`,
/// `PSI-03` and `PSI 03` on input.
///
/// # Examples
///
/// ```
/// use psi_engine::domain::ids::IndicatorId;
/// use std::str::FromStr;
///
/// let id = IndicatorId::from_str("psi-3").unwrap();
/// assert_eq!(id.as_str(), "PSI_03");
/// assert_eq!(id.number(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndicatorId(String);

impl IndicatorId {
    /// Creates a new IndicatorId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(IndicatorId)` if the string names a PSI number, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        let upper = trimmed.to_uppercase();
        let digits = upper
            .strip_prefix("PSI")
            .map(|rest| rest.trim_start_matches(['_', '-', ' ']))
            .ok_or_else(|| format!("Indicator ID must start with 'PSI', got: {trimmed}"))?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Indicator ID must end with a number, got: {trimmed}"));
        }

        let number: u8 = digits
            .parse()
            .map_err(|_| format!("Indicator number out of range: {trimmed}"))?;

        Ok(Self::from_number(number))
    }

    /// Creates the canonical identifier for a PSI number
    pub fn from_number(number: u8) -> Self {
        Self(format!("PSI_{number:02}"))
    }

    /// The standard indicator range, PSI_02 through PSI_19
    pub fn standard_range() -> Vec<Self> {
        (2..=19).map(Self::from_number).collect()
    }

    /// Returns the indicator ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the indicator number
    pub fn number(&self) -> u8 {
        self.0
            .strip_prefix("PSI_")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IndicatorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for IndicatorId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IndicatorId> for String {
    fn from(id: IndicatorId) -> Self {
        id.0
    }
}

impl AsRef<str> for IndicatorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encounter identifier newtype wrapper
///
/// Taken from the `EncounterID` column. Rows without one are labelled by their
/// position in the input (`Row1`, `Row2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterId(String);

impl EncounterId {
    /// Creates a new EncounterId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Encounter ID cannot be empty".to_string());
        }
        Ok(Self(id.trim().to_string()))
    }

    /// Fallback identifier for a record without an `EncounterID`
    pub fn for_row(index: usize) -> Self {
        Self(format!("Row{}", index + 1))
    }

    /// Returns the encounter ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EncounterId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_id_canonical_form() {
        assert_eq!(IndicatorId::new("PSI_02").unwrap().as_str(), "PSI_02");
        assert_eq!(IndicatorId::new("psi02").unwrap().as_str(), "PSI_02");
        assert_eq!(IndicatorId::new("PSI-13").unwrap().as_str(), "PSI_13");
        assert_eq!(IndicatorId::new(" psi 9 ").unwrap().as_str(), "PSI_09");
    }

    #[test]
    fn test_indicator_id_invalid() {
        assert!(IndicatorId::new("").is_err());
        assert!(IndicatorId::new("PQI_01").is_err());
        assert!(IndicatorId::new("PSI_").is_err());
        assert!(IndicatorId::new("PSI_1a").is_err());
        assert!(IndicatorId::new("PSI_999").is_err());
    }

    #[test]
    fn test_indicator_id_number_and_ordering() {
        let a = IndicatorId::from_number(3);
        let b = IndicatorId::from_number(15);
        assert_eq!(a.number(), 3);
        assert!(a < b);
    }

    #[test]
    fn test_standard_range() {
        let ids = IndicatorId::standard_range();
        assert_eq!(ids.len(), 18);
        assert_eq!(ids.first().unwrap().as_str(), "PSI_02");
        assert_eq!(ids.last().unwrap().as_str(), "PSI_19");
    }

    #[test]
    fn test_indicator_id_serialization() {
        let id = IndicatorId::new("psi_04").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"PSI_04\"");
        let back: IndicatorId = serde_json::from_str("\"PSI-4\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_encounter_id() {
        assert_eq!(EncounterId::new(" E100 ").unwrap().as_str(), "E100");
        assert!(EncounterId::new("  ").is_err());
        assert_eq!(EncounterId::for_row(0).as_str(), "Row1");
    }
}
