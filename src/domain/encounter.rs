//! Raw encounter record
//!
//! One hospital encounter exactly as it arrived: a flat map from column name to
//! JSON value. No interpretation happens here. Typed access lives in
//! [`crate::core::encounter::EncounterView`].

use super::ids::EncounterId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Number of secondary diagnosis slots (`DX1`..`DX25`)
pub const SECONDARY_DX_SLOTS: usize = 25;

/// Number of procedure slots (`Proc1`..`Proc10`)
pub const PROCEDURE_SLOTS: usize = 10;

/// A single encounter row keyed by column name
///
/// Unknown columns are kept so that required fields declared by an indicator
/// definition can be checked by name.
///
/// # Examples
///
/// ```
/// use psi_engine::domain::encounter::EncounterRecord;
///
/// let record = EncounterRecord::builder()
///     .id("E1")
///     .field("AGE", 67)
///     .principal("K35.80", "Y")
///     .secondary("L89.153", "N")
///     .build();
///
/// assert!(record.is_present("Pdx"));
/// assert!(record.is_present("DX1"));
/// assert!(!record.is_present("DX2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncounterRecord {
    fields: BTreeMap<String, Value>,
}

impl EncounterRecord {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing a record
    pub fn builder() -> EncounterRecordBuilder {
        EncounterRecordBuilder::default()
    }

    /// Returns the value of a column, treating null and blank strings as absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(value) => Some(value),
        }
    }

    /// Whether a column holds a usable value
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a column value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Column names in the record
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The encounter identifier, falling back to the row position
    ///
    /// # Arguments
    ///
    /// * `index` - Zero-based position of the record in its input batch
    pub fn encounter_id(&self, index: usize) -> EncounterId {
        self.get("EncounterID")
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .and_then(|raw| EncounterId::new(raw).ok())
            .unwrap_or_else(|| EncounterId::for_row(index))
    }
}

impl From<BTreeMap<String, Value>> for EncounterRecord {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

/// Builder for [`EncounterRecord`]
///
/// Diagnoses and procedures fill the next free slot, so the POA column pairing
/// (`DXi` with `POA{i+1}`) is always right.
#[derive(Debug, Default)]
pub struct EncounterRecordBuilder {
    record: EncounterRecord,
    secondary_count: usize,
    procedure_count: usize,
}

impl EncounterRecordBuilder {
    /// Creates a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `EncounterID` column
    pub fn id(self, id: impl Into<String>) -> Self {
        self.field("EncounterID", id.into())
    }

    /// Sets an arbitrary column
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.set(name, value);
        self
    }

    /// Sets the principal diagnosis (`Pdx`) and its POA flag (`POA1`)
    pub fn principal(self, code: &str, poa: &str) -> Self {
        self.field("Pdx", code).field("POA1", poa)
    }

    /// Appends a secondary diagnosis in the next `DX` slot
    ///
    /// Slots beyond the 25th are ignored.
    pub fn secondary(mut self, code: &str, poa: &str) -> Self {
        if self.secondary_count >= SECONDARY_DX_SLOTS {
            return self;
        }
        self.secondary_count += 1;
        let slot = self.secondary_count;
        self.record.set(format!("DX{slot}"), code);
        self.record.set(format!("POA{}", slot + 1), poa);
        self
    }

    /// Appends a procedure in the next `Proc` slot
    ///
    /// Slots beyond the 10th are ignored.
    pub fn procedure(mut self, code: &str, date: Option<&str>, time: Option<&str>) -> Self {
        if self.procedure_count >= PROCEDURE_SLOTS {
            return self;
        }
        self.procedure_count += 1;
        let slot = self.procedure_count;
        self.record.set(format!("Proc{slot}"), code);
        if let Some(date) = date {
            self.record.set(format!("Proc{slot}_Date"), date);
        }
        if let Some(time) = time {
            self.record.set(format!("Proc{slot}_Time"), time);
        }
        self
    }

    /// Builds the record
    pub fn build(self) -> EncounterRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_and_null_are_absent() {
        let mut record = EncounterRecord::new();
        record.set("SEX", "  ");
        record.set("AGE", Value::Null);
        record.set("MDC", 5);

        assert!(!record.is_present("SEX"));
        assert!(!record.is_present("AGE"));
        assert!(!record.is_present("DX1"));
        assert!(record.is_present("MDC"));
    }

    #[test]
    fn test_builder_pairs_secondary_with_next_poa() {
        let record = EncounterRecord::builder()
            .principal("A41.9", "N")
            .secondary("J18.9", "Y")
            .secondary("I10", "N")
            .build();

        assert_eq!(record.get("POA1"), Some(&json!("N")));
        assert_eq!(record.get("DX1"), Some(&json!("J18.9")));
        assert_eq!(record.get("POA2"), Some(&json!("Y")));
        assert_eq!(record.get("DX2"), Some(&json!("I10")));
        assert_eq!(record.get("POA3"), Some(&json!("N")));
    }

    #[test]
    fn test_builder_caps_procedure_slots() {
        let mut builder = EncounterRecord::builder();
        for _ in 0..12 {
            builder = builder.procedure("0DTJ4ZZ", Some("2024-01-01"), None);
        }
        let record = builder.build();

        assert!(record.is_present("Proc10"));
        assert!(!record.is_present("Proc11"));
    }

    #[test]
    fn test_encounter_id_fallback() {
        let record = EncounterRecord::builder().field("EncounterID", 1234).build();
        assert_eq!(record.encounter_id(0).as_str(), "1234");

        let anonymous = EncounterRecord::new();
        assert_eq!(anonymous.encounter_id(4).as_str(), "Row5");
    }

    #[test]
    fn test_deserialize_flat_object() {
        let record: EncounterRecord = serde_json::from_value(json!({
            "EncounterID": "E9",
            "AGE": 40,
            "Pdx": "K80.00",
            "Custom_Column": "kept"
        }))
        .unwrap();

        assert_eq!(record.encounter_id(0).as_str(), "E9");
        assert!(record.columns().any(|c| c == "Custom_Column"));
    }
}
