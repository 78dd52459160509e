//! Typed, read-only view over one encounter record
//!
//! The view is built once per encounter and reused for every indicator. It
//! owns the derived diagnosis and procedure lists and normalises every field
//! the evaluators read:
//!
//! - POA flags become a closed [`PoaStatus`] enumeration.
//! - Codes are trimmed and numbers are rendered without a fraction.
//! - Numeric columns are read as whole numbers; a value that is neither a
//!   number nor a numeric string is reported as malformed by the accessor.
//! - Dates are resolved through [`super::datetime`].

use super::datetime;
use crate::domain::encounter::{EncounterRecord, PROCEDURE_SLOTS, SECONDARY_DX_SLOTS};
use crate::domain::errors::EvaluationError;
use crate::domain::result::EvalResult;
use crate::reference::normalize_code;
use chrono::NaiveDateTime;
use serde_json::Value;

/// Present-on-admission indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoaStatus {
    /// `Y`: present at the time of admission
    Yes,
    /// `N`: not present at the time of admission
    No,
    /// `U`: documentation insufficient to decide
    InsufficientDocumentation,
    /// `W`: clinically undetermined
    ClinicallyUndetermined,
    /// Missing or any other value
    Unknown,
}

impl PoaStatus {
    /// Normalises a raw POA value
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_uppercase()).as_deref() {
            Some("Y") => PoaStatus::Yes,
            Some("N") => PoaStatus::No,
            Some("U") => PoaStatus::InsufficientDocumentation,
            Some("W") => PoaStatus::ClinicallyUndetermined,
            _ => PoaStatus::Unknown,
        }
    }

    /// Only an explicit `Y` means present on admission
    pub fn is_present_on_admission(&self) -> bool {
        matches!(self, PoaStatus::Yes)
    }

    /// Whether the condition counts as arising during the stay
    pub fn is_acquired(&self) -> bool {
        !self.is_present_on_admission()
    }
}

/// A diagnosis with its slot position and POA flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisEntry {
    pub code: String,
    /// 0 for the principal diagnosis, 1..=25 for `DX1`..`DX25`
    pub position: usize,
    pub poa: PoaStatus,
}

impl DiagnosisEntry {
    pub fn is_principal(&self) -> bool {
        self.position == 0
    }

    /// Secondary and not present on admission
    pub fn is_acquired_secondary(&self) -> bool {
        !self.is_principal() && self.poa.is_acquired()
    }

    /// Principal, or present on admission
    pub fn is_principal_or_poa(&self) -> bool {
        self.is_principal() || self.poa.is_present_on_admission()
    }
}

/// A procedure with its slot and resolved timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureEntry {
    pub code: String,
    /// 1..=10 for `Proc1`..`Proc10`
    pub slot: usize,
    pub timestamp: Option<NaiveDateTime>,
}

/// Read-only adapter over an [`EncounterRecord`]
#[derive(Debug, Clone)]
pub struct EncounterView<'a> {
    record: &'a EncounterRecord,
    diagnoses: Vec<DiagnosisEntry>,
    procedures: Vec<ProcedureEntry>,
    admission: Option<NaiveDateTime>,
}

impl<'a> EncounterView<'a> {
    /// Builds the view, deriving the diagnosis and procedure lists
    pub fn new(record: &'a EncounterRecord) -> Self {
        let mut diagnoses = Vec::with_capacity(SECONDARY_DX_SLOTS + 1);
        if let Some(code) = code_of(record.get("Pdx")) {
            diagnoses.push(DiagnosisEntry {
                code,
                position: 0,
                poa: poa_of(record, "POA1"),
            });
        }
        for slot in 1..=SECONDARY_DX_SLOTS {
            if let Some(code) = code_of(record.get(&format!("DX{slot}"))) {
                diagnoses.push(DiagnosisEntry {
                    code,
                    position: slot,
                    poa: poa_of(record, &format!("POA{}", slot + 1)),
                });
            }
        }

        let procedures = (1..=PROCEDURE_SLOTS)
            .filter_map(|slot| {
                let code = code_of(record.get(&format!("Proc{slot}")))?;
                let timestamp = resolve_timestamp(
                    record,
                    &format!("Proc{slot}_Date"),
                    Some(&format!("Proc{slot}_Time")),
                );
                Some(ProcedureEntry {
                    code,
                    slot,
                    timestamp,
                })
            })
            .collect();

        Self {
            record,
            diagnoses,
            procedures,
            admission: resolve_timestamp(record, "Admission_Date", None),
        }
    }

    /// The underlying record
    pub fn record(&self) -> &EncounterRecord {
        self.record
    }

    /// All diagnoses in slot order, principal first
    pub fn diagnoses(&self) -> &[DiagnosisEntry] {
        &self.diagnoses
    }

    /// The principal diagnosis, if recorded
    pub fn principal(&self) -> Option<&DiagnosisEntry> {
        self.diagnoses.first().filter(|d| d.is_principal())
    }

    /// Secondary diagnoses in slot order
    pub fn secondaries(&self) -> impl Iterator<Item = &DiagnosisEntry> {
        self.diagnoses.iter().filter(|d| !d.is_principal())
    }

    /// Procedures in slot order
    pub fn procedures(&self) -> &[ProcedureEntry] {
        &self.procedures
    }

    pub fn admission_date(&self) -> Option<NaiveDateTime> {
        self.admission
    }

    /// A column as trimmed text, numbers rendered without a fraction
    pub fn text(&self, field: &str) -> Option<String> {
        code_of(self.record.get(field))
    }

    /// A column as a whole number
    ///
    /// # Errors
    ///
    /// Returns `MalformedField` if the value is present but not numeric
    pub fn integer(&self, field: &str) -> EvalResult<Option<i64>> {
        match self.record.get(field) {
            None => Ok(None),
            Some(value) => integer_of(value)
                .map(Some)
                .ok_or_else(|| EvaluationError::malformed(field, display_value(value))),
        }
    }

    /// MS-DRG, normalised the same way as code set entries
    pub fn drg(&self) -> Option<String> {
        code_of(self.record.get("MS-DRG")).map(|drg| normalize_code(&drg))
    }

    pub fn age(&self) -> EvalResult<Option<i64>> {
        self.integer("AGE")
    }

    pub fn mdc(&self) -> EvalResult<Option<i64>> {
        self.integer("MDC")
    }

    pub fn admission_type(&self) -> EvalResult<Option<i64>> {
        self.integer("ATYPE")
    }

    pub fn discharge_disposition(&self) -> EvalResult<Option<i64>> {
        self.integer("Discharge_Disposition")
    }

    pub fn length_of_stay(&self) -> EvalResult<Option<i64>> {
        self.integer("Length_of_stay")
    }

    pub fn point_of_origin(&self) -> Option<String> {
        self.text("POINTOFORIGINUB04")
    }
}

fn code_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_i64().map(|i| i as f64).or_else(|| n.as_f64())?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| number.trunc() as i64)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn poa_of(record: &EncounterRecord, field: &str) -> PoaStatus {
    PoaStatus::from_raw(code_of(record.get(field)).as_deref())
}

fn resolve_timestamp(record: &EncounterRecord, date_field: &str, time_field: Option<&str>) -> Option<NaiveDateTime> {
    let date = code_of(record.get(date_field));
    let time = time_field.and_then(|f| code_of(record.get(f)));
    let resolved = datetime::resolve(date.as_deref(), time.as_deref());
    if resolved.is_none() && date.is_some() {
        tracing::debug!(
            field = date_field,
            date = ?date,
            time = ?time,
            "Unresolvable date/time, treating as missing"
        );
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> EncounterRecord {
        EncounterRecord::builder()
            .id("E1")
            .field("AGE", "54.7")
            .field("MS-DRG", 4)
            .field("MDC", 5.0)
            .field("ATYPE", "elective")
            .field("Admission_Date", "2024-05-01")
            .principal("I21.4", "y")
            .secondary("I50.9", "N")
            .field("DX3", "J96.01")
            .field("POA4", "X")
            .procedure("02703ZZ", Some("2024-05-02"), Some("930"))
            .field("Proc3", "5A1955Z")
            .field("Proc3_Date", "2024-05-04")
            .field("Proc3_Time", 100)
            .build()
    }

    #[test]
    fn test_diagnoses_keep_positions_and_poa_pairing() {
        let record = sample();
        let view = EncounterView::new(&record);
        let dx = view.diagnoses();

        assert_eq!(dx.len(), 3);
        assert_eq!(dx[0].position, 0);
        assert_eq!(dx[0].poa, PoaStatus::Yes);
        assert_eq!(dx[1].position, 1);
        assert_eq!(dx[1].poa, PoaStatus::No);
        assert_eq!(dx[2].position, 3);
        assert_eq!(dx[2].poa, PoaStatus::Unknown);
        assert!(dx[2].is_acquired_secondary());
        assert!(view.principal().unwrap().is_principal_or_poa());
    }

    #[test]
    fn test_procedures_skip_empty_slots() {
        let record = sample();
        let view = EncounterView::new(&record);
        let procs = view.procedures();

        assert_eq!(procs.len(), 2);
        assert_eq!(procs[0].slot, 1);
        assert_eq!(procs[1].slot, 3);
        assert_eq!(
            procs[1].timestamp.map(|t| t.to_string()),
            Some("2024-05-04 01:00:00".to_string())
        );
    }

    #[test]
    fn test_invalid_time_makes_timestamp_unresolvable() {
        let record = EncounterRecord::builder()
            .procedure("0DTJ4ZZ", Some("2024-05-02"), Some("9.30"))
            .build();
        let view = EncounterView::new(&record);
        assert_eq!(view.procedures()[0].timestamp, None);
    }

    #[test]
    fn test_numeric_accessors() {
        let record = sample();
        let view = EncounterView::new(&record);

        assert_eq!(view.age().unwrap(), Some(54));
        assert_eq!(view.mdc().unwrap(), Some(5));
        assert_eq!(view.length_of_stay().unwrap(), None);
        assert_eq!(
            view.admission_type().unwrap_err(),
            EvaluationError::malformed("ATYPE", "elective")
        );
    }

    #[test]
    fn test_drg_is_zero_padded() {
        let record = sample();
        assert_eq!(EncounterView::new(&record).drg().as_deref(), Some("004"));

        let record = EncounterRecord::builder().field("MS-DRG", " 871 ").build();
        assert_eq!(EncounterView::new(&record).drg().as_deref(), Some("871"));

        let record = EncounterRecord::builder().field("MS-DRG", 470.0).build();
        assert_eq!(EncounterView::new(&record).drg().as_deref(), Some("470"));

        let record = EncounterRecord::builder().field("MS-DRG", "04").build();
        assert_eq!(EncounterView::new(&record).drg().as_deref(), Some("004"));
    }

    #[test]
    fn test_numeric_codes_render_without_fraction() {
        let mut record = EncounterRecord::new();
        record.set("Pdx", json!(12345.0));
        let view = EncounterView::new(&record);
        assert_eq!(view.principal().map(|d| d.code.as_str()), Some("12345"));
    }

    #[test]
    fn test_poa_normalisation() {
        assert_eq!(PoaStatus::from_raw(Some(" w ")), PoaStatus::ClinicallyUndetermined);
        assert_eq!(PoaStatus::from_raw(Some("U")), PoaStatus::InsufficientDocumentation);
        assert_eq!(PoaStatus::from_raw(Some("1")), PoaStatus::Unknown);
        assert_eq!(PoaStatus::from_raw(None), PoaStatus::Unknown);
        assert!(PoaStatus::Unknown.is_acquired());
        assert!(!PoaStatus::Yes.is_acquired());
    }
}
