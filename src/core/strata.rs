//! Stratification and risk assignment shared by the indicator evaluators
//!
//! Every assigner here is a priority ladder: candidates are checked in a fixed
//! order and the first that matches wins, so the result is deterministic for
//! a given encounter.

use crate::core::encounter::{has_procedure_in_window, DayWindow, DiagnosisEntry, EncounterView};
use crate::domain::result::EvalResult;
use crate::reference::{
    code_sets::UNSPECIFIED_PRESSURE_ULCER_SETS, CodeSetRegistry, IndicatorDefinition, StratumExclusionRule,
    PRESSURE_ULCER_SITES,
};
use chrono::NaiveDateTime;

/// Finds a hospital-acquired pressure ulcer that counts toward the numerator
///
/// A diagnosis not present on admission qualifies when it is in an
/// unspecified-site set, or when it is in a specific-site set and no
/// diagnosis in that site's deep tissue injury set is present on admission.
pub fn qualifying_pressure_ulcer<'v>(view: &'v EncounterView, codes: &CodeSetRegistry) -> Option<&'v DiagnosisEntry> {
    view.diagnoses()
        .iter()
        .filter(|dx| dx.poa.is_acquired())
        .find(|dx| {
            let unspecified = UNSPECIFIED_PRESSURE_ULCER_SETS
                .iter()
                .any(|set| codes.contains(set, &dx.code));

            unspecified
                || PRESSURE_ULCER_SITES
                    .iter()
                    .filter(|(site, _)| codes.contains(site, &dx.code))
                    .any(|(_, dti)| !dti_present_on_admission(view, codes, dti))
        })
}

fn dti_present_on_admission(view: &EncounterView, codes: &CodeSetRegistry, dti_set: &str) -> bool {
    view.diagnoses()
        .iter()
        .any(|dx| dx.poa.is_present_on_admission() && codes.contains(dti_set, &dx.code))
}

/// Serious treatable complication strata for surgical mortality, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplicationStratum {
    Shock,
    Sepsis,
    Pneumonia,
    GiHemorrhage,
    DvtPe,
}

impl ComplicationStratum {
    /// Every stratum, highest priority first
    pub const PRIORITY: [ComplicationStratum; 5] = [
        ComplicationStratum::Shock,
        ComplicationStratum::Sepsis,
        ComplicationStratum::Pneumonia,
        ComplicationStratum::GiHemorrhage,
        ComplicationStratum::DvtPe,
    ];

    /// Stratum name in the indicator catalog
    pub fn catalog_name(&self) -> &'static str {
        match self {
            ComplicationStratum::Shock => "STRATUM_SHOCK",
            ComplicationStratum::Sepsis => "STRATUM_SEPSIS",
            ComplicationStratum::Pneumonia => "STRATUM_PNEUMONIA",
            ComplicationStratum::GiHemorrhage => "STRATUM_GI_HEMORRHAGE",
            ComplicationStratum::DvtPe => "STRATUM_DVT_PE",
        }
    }

    /// Human-readable label, e.g. `GI HEMORRHAGE`
    pub fn label(&self) -> String {
        self.catalog_name()
            .trim_start_matches("STRATUM_")
            .replace('_', " ")
    }

    fn diagnosis_set(&self) -> &'static str {
        match self {
            ComplicationStratum::Shock => "FTR5DX",
            ComplicationStratum::Sepsis => "FTR4DX",
            ComplicationStratum::Pneumonia => "FTR3DX",
            ComplicationStratum::GiHemorrhage => "FTR6DX",
            ComplicationStratum::DvtPe => "FTR2DXB",
        }
    }

    fn meets_inclusion(&self, view: &EncounterView, codes: &CodeSetRegistry, first_or: Option<NaiveDateTime>) -> bool {
        let acquired = view
            .secondaries()
            .any(|dx| dx.poa.is_acquired() && codes.contains(self.diagnosis_set(), &dx.code));

        match self {
            ComplicationStratum::Shock => {
                acquired
                    || has_procedure_in_window(
                        view.procedures(),
                        first_or,
                        codes.lookup("FTR5PR"),
                        DayWindow::at_least(0),
                    )
            }
            _ => acquired,
        }
    }
}

/// Assigns the highest-priority complication stratum whose inclusion is met
/// and whose catalog exclusions are all clear
///
/// # Errors
///
/// Returns an error if an MDC rule needs the MDC and it is malformed
pub fn assign_complication_stratum(
    view: &EncounterView,
    codes: &CodeSetRegistry,
    definition: &IndicatorDefinition,
    first_or: Option<NaiveDateTime>,
) -> EvalResult<Option<ComplicationStratum>> {
    for stratum in ComplicationStratum::PRIORITY {
        if !stratum.meets_inclusion(view, codes, first_or) {
            continue;
        }
        let rules = definition
            .stratum(stratum.catalog_name())
            .map(|s| s.exclusions.as_slice())
            .unwrap_or_default();

        let mut excluded = false;
        for rule in rules {
            if rule_applies(rule, view, codes)? {
                tracing::trace!(stratum = stratum.catalog_name(), rule = ?rule, "Stratum excluded");
                excluded = true;
                break;
            }
        }
        if !excluded {
            return Ok(Some(stratum));
        }
    }
    Ok(None)
}

/// Interprets one structured stratum exclusion rule
pub fn rule_applies(rule: &StratumExclusionRule, view: &EncounterView, codes: &CodeSetRegistry) -> EvalResult<bool> {
    let any_dx = |set: &str| view.diagnoses().iter().any(|dx| codes.contains(set, &dx.code));

    Ok(match rule {
        StratumExclusionRule::PrincipalDiagnosisIn { code_set } => view
            .principal()
            .is_some_and(|dx| codes.contains(code_set, &dx.code)),
        StratumExclusionRule::AnyDiagnosisIn { code_set } => any_dx(code_set),
        StratumExclusionRule::MdcEquals { mdc } => view.mdc()? == Some(*mdc),
        StratumExclusionRule::CompoundCodeSetPair { first, second } => any_dx(first) && any_dx(second),
        StratumExclusionRule::ProcedurePresent { code_set } => view
            .procedures()
            .iter()
            .any(|p| codes.contains(code_set, &p.code)),
    })
}

/// Immune-function risk tiers for postoperative sepsis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmuneRisk {
    SevereImmuneCompromise,
    ModerateImmuneCompromise,
    MalignancyWithTreatment,
    BaselineRisk,
}

impl ImmuneRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImmuneRisk::SevereImmuneCompromise => "severe_immune_compromise",
            ImmuneRisk::ModerateImmuneCompromise => "moderate_immune_compromise",
            ImmuneRisk::MalignancyWithTreatment => "malignancy_with_treatment",
            ImmuneRisk::BaselineRisk => "baseline_risk",
        }
    }
}

/// Assigns the immune-function risk tier; the first matching tier wins
pub fn assign_immune_risk(view: &EncounterView, codes: &CodeSetRegistry) -> ImmuneRisk {
    let any_dx = |set: &str| view.diagnoses().iter().any(|dx| codes.contains(set, &dx.code));
    let any_proc = |set: &str| view.procedures().iter().any(|p| codes.contains(set, &p.code));

    if any_dx("SEVEREIMMUNEDX") || any_proc("SEVEREIMMUNEPROC") {
        ImmuneRisk::SevereImmuneCompromise
    } else if any_dx("MODERATEIMMUNEDX") || any_proc("MODERATEIMMUNEPROC") {
        ImmuneRisk::ModerateImmuneCompromise
    } else if any_dx("CANCEID") && any_proc("CHEMORADTXPROC") {
        ImmuneRisk::MalignancyWithTreatment
    } else {
        ImmuneRisk::BaselineRisk
    }
}

/// Procedure complexity on the index date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureComplexity {
    High,
    Moderate,
    Low,
}

impl ProcedureComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureComplexity::High => "high_complexity",
            ProcedureComplexity::Moderate => "moderate_complexity",
            ProcedureComplexity::Low => "low_complexity",
        }
    }
}

/// Categorises complexity from procedures on the index procedure's calendar date
pub fn assign_procedure_complexity(
    view: &EncounterView,
    codes: &CodeSetRegistry,
    index: Option<NaiveDateTime>,
) -> ProcedureComplexity {
    let Some(index_date) = index.map(|ts| ts.date()) else {
        return ProcedureComplexity::Low;
    };
    let on_index_date = |set: &str| {
        view.procedures()
            .iter()
            .filter(|p| p.timestamp.is_some_and(|ts| ts.date() == index_date))
            .any(|p| codes.contains(set, &p.code))
    };

    if on_index_date("PCLASSHIGH") {
        ProcedureComplexity::High
    } else if on_index_date("PCLASSMODERATE") {
        ProcedureComplexity::Moderate
    } else {
        ProcedureComplexity::Low
    }
}

/// Surgical approach stratum for wound dehiscence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurgicalApproach {
    Open,
    NonOpen,
    Unknown,
}

impl SurgicalApproach {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurgicalApproach::Open => "open_approach",
            SurgicalApproach::NonOpen => "non_open_approach",
            SurgicalApproach::Unknown => "unknown_approach",
        }
    }
}

/// Open approach outranks non-open; neither gives `Unknown`
pub fn assign_surgical_approach(view: &EncounterView, codes: &CodeSetRegistry) -> SurgicalApproach {
    let any_proc = |set: &str| view.procedures().iter().any(|p| codes.contains(set, &p.code));

    if any_proc("ABDOMIPOPEN") {
        SurgicalApproach::Open
    } else if any_proc("ABDOMIPOTHER") {
        SurgicalApproach::NonOpen
    } else {
        SurgicalApproach::Unknown
    }
}

/// Result of organ-injury matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganInjuryMatch<'v> {
    /// An injury present on admission with a same-organ procedure in the window
    PresentOnAdmission(&'v DiagnosisEntry),
    /// An acquired injury with a same-organ procedure in the window
    Qualifying(&'v DiagnosisEntry),
    NoMatch,
}

const ORGAN_PROCEDURE_WINDOW: DayWindow = DayWindow::between(1, 30);

/// Matches secondary injury diagnoses to same-organ procedures 1-30 days
/// after the index procedure
///
/// Secondary diagnoses are scanned in slot order and the first decisive one
/// wins. An injury present on admission without a procedure in the window is
/// skipped.
pub fn match_organ_injury<'v>(
    view: &'v EncounterView,
    codes: &CodeSetRegistry,
    index: Option<NaiveDateTime>,
) -> OrganInjuryMatch<'v> {
    for dx in view.secondaries() {
        let Some(organ) = codes.organ_for_diagnosis(&dx.code) else {
            continue;
        };
        let related = has_procedure_in_window(
            view.procedures(),
            index,
            codes.lookup(organ.procedure_set),
            ORGAN_PROCEDURE_WINDOW,
        );
        if !related {
            continue;
        }
        return if dx.poa.is_present_on_admission() {
            OrganInjuryMatch::PresentOnAdmission(dx)
        } else {
            OrganInjuryMatch::Qualifying(dx)
        };
    }
    OrganInjuryMatch::NoMatch
}
