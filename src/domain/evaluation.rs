//! Evaluation output types
//!
//! An evaluator produces an [`Outcome`]. The orchestrator stamps it with the
//! encounter and indicator identifiers to make an [`EvaluationResult`], the one
//! row per (encounter, indicator) pair that downstream reporting reads.

use super::ids::{EncounterId, IndicatorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of one encounter against one indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvaluationStatus {
    /// The encounter is in the indicator's numerator
    Inclusion,
    /// The encounter is outside the numerator or the denominator
    Exclusion,
    /// Evaluation failed for this pair
    Error,
    /// No evaluator is registered for the indicator
    #[serde(rename = "Not Implemented")]
    NotImplemented,
}

impl EvaluationStatus {
    /// Every status, in reporting order
    pub const ALL: [EvaluationStatus; 4] = [
        EvaluationStatus::Inclusion,
        EvaluationStatus::Exclusion,
        EvaluationStatus::Error,
        EvaluationStatus::NotImplemented,
    ];

    /// Returns the status label used in output files
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Inclusion => "Inclusion",
            EvaluationStatus::Exclusion => "Exclusion",
            EvaluationStatus::Error => "Error",
            EvaluationStatus::NotImplemented => "Not Implemented",
        }
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision returned by a base exclusion check or an indicator evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: EvaluationStatus,
    pub reason: String,
    pub details: BTreeMap<String, String>,
}

impl Outcome {
    /// The encounter is in the numerator
    pub fn inclusion(reason: impl Into<String>) -> Self {
        Self::with_status(EvaluationStatus::Inclusion, reason)
    }

    /// The encounter is excluded, with the reason why
    pub fn exclusion(reason: impl Into<String>) -> Self {
        Self::with_status(EvaluationStatus::Exclusion, reason)
    }

    fn with_status(status: EvaluationStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attaches a structured detail (stratum, risk category, ...)
    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Whether this outcome places the encounter in the numerator
    pub fn is_inclusion(&self) -> bool {
        self.status == EvaluationStatus::Inclusion
    }
}

/// One output row: an encounter classified against an indicator
///
/// Field names follow the column headers of the results file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(rename = "EncounterID")]
    pub encounter_id: EncounterId,

    #[serde(rename = "PSI")]
    pub indicator: IndicatorId,

    #[serde(rename = "Status")]
    pub status: EvaluationStatus,

    #[serde(rename = "Rationale")]
    pub reason: String,

    #[serde(rename = "Details", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl EvaluationResult {
    /// Builds a result row from an outcome
    pub fn from_outcome(encounter_id: EncounterId, indicator: IndicatorId, outcome: Outcome) -> Self {
        Self {
            encounter_id,
            indicator,
            status: outcome.status,
            reason: outcome.reason,
            details: outcome.details,
        }
    }

    /// An `Error` row for a pair whose evaluation failed
    pub fn error(encounter_id: EncounterId, indicator: IndicatorId, reason: impl Into<String>) -> Self {
        Self {
            encounter_id,
            indicator,
            status: EvaluationStatus::Error,
            reason: reason.into(),
            details: BTreeMap::new(),
        }
    }

    /// A `Not Implemented` row for an indicator with no evaluator
    pub fn not_implemented(encounter_id: EncounterId, indicator: IndicatorId) -> Self {
        let reason = format!("Evaluation logic for {indicator} not found.");
        Self {
            encounter_id,
            indicator,
            status: EvaluationStatus::NotImplemented,
            reason,
            details: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_labels() {
        assert_eq!(EvaluationStatus::NotImplemented.to_string(), "Not Implemented");
        assert_eq!(
            serde_json::to_value(EvaluationStatus::NotImplemented).unwrap(),
            json!("Not Implemented")
        );
        assert_eq!(serde_json::to_value(EvaluationStatus::Error).unwrap(), json!("Error"));
    }

    #[test]
    fn test_outcome_details() {
        let outcome = Outcome::inclusion("Inclusion: test").with_detail("stratum", "SHOCK");
        assert!(outcome.is_inclusion());
        assert_eq!(outcome.details.get("stratum").map(String::as_str), Some("SHOCK"));
    }

    #[test]
    fn test_result_serialization_omits_empty_details() {
        let row = EvaluationResult::not_implemented(
            EncounterId::new("E1").unwrap(),
            IndicatorId::from_number(16),
        );
        let value = serde_json::to_value(&row).unwrap();

        assert_eq!(value["EncounterID"], json!("E1"));
        assert_eq!(value["PSI"], json!("PSI_16"));
        assert_eq!(value["Status"], json!("Not Implemented"));
        assert_eq!(value["Rationale"], json!("Evaluation logic for PSI_16 not found."));
        assert!(value.get("Details").is_none());
    }
}
