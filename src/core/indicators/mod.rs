//! Indicator evaluators and their dispatch table
//!
//! Each evaluator is a plain function from an [`IndicatorContext`] to an
//! [`Outcome`]. Evaluators only run after the base exclusions have passed.
//! The [`IndicatorRegistry`] maps indicator ids to evaluators once, at
//! start-up; an id with no entry is reported as not implemented.
//!
//! Evaluators are grouped by the shape of their rules:
//!
//! - [`mortality`]: PSI_02, PSI_04
//! - [`hospital_acquired`]: PSI_03, PSI_05 to PSI_08
//! - [`postoperative`]: PSI_09 to PSI_13
//! - [`abdominopelvic`]: PSI_14, PSI_15
//! - [`obstetric_newborn`]: PSI_17 to PSI_19

pub mod abdominopelvic;
pub mod hospital_acquired;
pub mod mortality;
pub mod obstetric_newborn;
pub mod postoperative;

use crate::core::encounter::{datetime, DayWindow, DiagnosisEntry, EncounterView, ProcedureEntry};
use crate::domain::evaluation::Outcome;
use crate::domain::ids::IndicatorId;
use crate::domain::result::EvalResult;
use crate::reference::{CodeSetRegistry, IndicatorDefinition};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Signature shared by every indicator evaluator
pub type Evaluator = fn(&IndicatorContext<'_>) -> EvalResult<Outcome>;

/// Everything an evaluator may read for one (encounter, indicator) pair
#[derive(Debug, Clone, Copy)]
pub struct IndicatorContext<'a> {
    pub view: &'a EncounterView<'a>,
    pub codes: &'a CodeSetRegistry,
    pub definition: &'a IndicatorDefinition,
}

impl<'a> IndicatorContext<'a> {
    pub fn new(view: &'a EncounterView<'a>, codes: &'a CodeSetRegistry, definition: &'a IndicatorDefinition) -> Self {
        Self {
            view,
            codes,
            definition,
        }
    }

    /// Whether `code` is in the named set
    pub fn in_set(&self, set: &str, code: &str) -> bool {
        self.codes.contains(set, code)
    }

    /// Whether the DRG belongs to any of the named sets
    pub fn drg_in(&self, sets: &[&str]) -> bool {
        self.view
            .drg()
            .is_some_and(|drg| sets.iter().any(|set| self.in_set(set, &drg)))
    }

    /// The principal diagnosis, if it is in the named set
    pub fn principal_in(&self, set: &str) -> Option<&'a DiagnosisEntry> {
        self.view.principal().filter(|dx| self.in_set(set, &dx.code))
    }

    /// The first diagnosis, in slot order, that is in the named set
    pub fn first_diagnosis_in(&self, set: &str) -> Option<&'a DiagnosisEntry> {
        self.view.diagnoses().iter().find(|dx| self.in_set(set, &dx.code))
    }

    /// The first secondary diagnosis in the set that was not present on admission
    pub fn acquired_secondary_in(&self, set: &str) -> Option<&'a DiagnosisEntry> {
        self.view
            .secondaries()
            .find(|dx| dx.poa.is_acquired() && self.in_set(set, &dx.code))
    }

    /// The first diagnosis in the set flagged present on admission
    pub fn poa_diagnosis_in(&self, set: &str) -> Option<&'a DiagnosisEntry> {
        self.view
            .diagnoses()
            .iter()
            .find(|dx| dx.poa.is_present_on_admission() && self.in_set(set, &dx.code))
    }

    /// The first procedure, in slot order, that is in the named set
    pub fn any_procedure_in(&self, set: &str) -> Option<&'a ProcedureEntry> {
        self.view.procedures().iter().find(|p| self.in_set(set, &p.code))
    }

    pub fn first_procedure_date(&self, set: &str) -> Option<NaiveDateTime> {
        datetime::first_procedure_date(self.view.procedures(), self.codes.lookup(set))
    }

    pub fn last_procedure_date(&self, set: &str) -> Option<NaiveDateTime> {
        datetime::last_procedure_date(self.view.procedures(), self.codes.lookup(set))
    }

    /// Whether a procedure in the set falls in `window` relative to `reference`
    pub fn procedure_in_window(&self, reference: Option<NaiveDateTime>, set: &str, window: DayWindow) -> bool {
        datetime::has_procedure_in_window(self.view.procedures(), reference, self.codes.lookup(set), window)
    }

    /// Whole days from admission to `to`
    pub fn days_from_admission(&self, to: Option<NaiveDateTime>) -> Option<i64> {
        datetime::days_between(self.view.admission_date(), to)
    }
}

/// Surgical MS-DRGs
pub(crate) const SURGICAL_DRGS: &[&str] = &["SURGI2R"];

/// Surgical or medical MS-DRGs
pub(crate) const SURGICAL_OR_MEDICAL_DRGS: &[&str] = &["SURGI2R", "MEDIC2R"];

const ELECTIVE_ADMISSION: i64 = 3;
const TRANSFER_TO_ACUTE_CARE: i64 = 2;
const DEATH: i64 = 20;
const HOSPICE_ORIGIN: &str = "F";

pub(crate) fn no_diagnoses() -> Outcome {
    Outcome::exclusion("Data Exclusion: No diagnoses found")
}

pub(crate) fn not_surgical_drg() -> Outcome {
    Outcome::exclusion("Denominator Exclusion: Not a surgical MS-DRG")
}

pub(crate) fn not_surgical_or_medical_drg() -> Outcome {
    Outcome::exclusion("Denominator Exclusion: Not a surgical or medical MS-DRG")
}

pub(crate) fn is_elective(ctx: &IndicatorContext<'_>) -> EvalResult<bool> {
    Ok(ctx.view.admission_type()? == Some(ELECTIVE_ADMISSION))
}

pub(crate) fn is_transfer_to_acute_care(ctx: &IndicatorContext<'_>) -> EvalResult<bool> {
    Ok(ctx.view.discharge_disposition()? == Some(TRANSFER_TO_ACUTE_CARE))
}

pub(crate) fn is_death(ctx: &IndicatorContext<'_>) -> EvalResult<bool> {
    Ok(ctx.view.discharge_disposition()? == Some(DEATH))
}

pub(crate) fn is_hospice_admission(ctx: &IndicatorContext<'_>) -> bool {
    ctx.view.point_of_origin().as_deref() == Some(HOSPICE_ORIGIN)
}

/// Length of stay is at least `days`; a missing stay fails
pub(crate) fn stay_at_least(ctx: &IndicatorContext<'_>, days: i64) -> EvalResult<bool> {
    Ok(ctx.view.length_of_stay()?.is_some_and(|los| los >= days))
}

/// Explicit id to evaluator dispatch table
#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    evaluators: HashMap<IndicatorId, Evaluator>,
}

impl IndicatorRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every implemented indicator
    ///
    /// PSI_16 has no evaluator.
    pub fn standard() -> Self {
        let entries: [(u8, Evaluator); 17] = [
            (2, mortality::psi02),
            (3, hospital_acquired::psi03),
            (4, mortality::psi04),
            (5, hospital_acquired::psi05),
            (6, hospital_acquired::psi06),
            (7, hospital_acquired::psi07),
            (8, hospital_acquired::psi08),
            (9, postoperative::psi09),
            (10, postoperative::psi10),
            (11, postoperative::psi11),
            (12, postoperative::psi12),
            (13, postoperative::psi13),
            (14, abdominopelvic::psi14),
            (15, abdominopelvic::psi15),
            (17, obstetric_newborn::psi17),
            (18, obstetric_newborn::psi18),
            (19, obstetric_newborn::psi19),
        ];

        let mut registry = Self::new();
        for (number, evaluator) in entries {
            registry.register(IndicatorId::from_number(number), evaluator);
        }
        registry
    }

    /// Registers or replaces an evaluator
    pub fn register(&mut self, id: IndicatorId, evaluator: Evaluator) {
        self.evaluators.insert(id, evaluator);
    }

    /// The evaluator for an indicator, if one is registered
    pub fn get(&self, id: &IndicatorId) -> Option<Evaluator> {
        self.evaluators.get(id).copied()
    }

    /// Registered indicator ids, sorted
    pub fn ids(&self) -> Vec<IndicatorId> {
        let mut ids: Vec<IndicatorId> = self.evaluators.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}
