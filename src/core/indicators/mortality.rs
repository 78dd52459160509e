//! Mortality indicators: death in low-mortality DRGs and death among surgical
//! inpatients with serious treatable complications

use super::{
    is_death, is_elective, is_hospice_admission, is_transfer_to_acute_care, no_diagnoses, not_surgical_drg,
    IndicatorContext, SURGICAL_DRGS,
};
use crate::core::exclusions;
use crate::core::strata;
use crate::domain::evaluation::Outcome;
use crate::domain::result::EvalResult;

/// PSI_02: death rate in low-mortality DRGs
pub fn psi02(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(&["LOWMODR"]) {
        return Ok(Outcome::exclusion("Denominator Exclusion: Not a low-mortality DRG"));
    }

    for dx in ctx.view.diagnoses() {
        if ctx.in_set("TRAUMID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Trauma diagnosis present ({})",
                dx.code
            )));
        }
        if ctx.in_set("CANCEID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Cancer diagnosis present ({})",
                dx.code
            )));
        }
        if ctx.in_set("IMMUNID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Immunocompromised diagnosis present ({})",
                dx.code
            )));
        }
    }

    if let Some(proc) = ctx.any_procedure_in("IMMUNIP") {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Immunocompromising procedure present ({})",
            proc.code
        )));
    }

    if is_hospice_admission(ctx) {
        return Ok(Outcome::exclusion("Denominator Exclusion: Admission from hospice facility"));
    }

    if is_transfer_to_acute_care(ctx)? {
        return Ok(Outcome::exclusion(
            "Population Exclusion: Transfer to acute care facility (Discharge_Disposition=2)",
        ));
    }

    if is_death(ctx)? {
        Ok(Outcome::inclusion("Inclusion: Death disposition (DISP=20)"))
    } else {
        Ok(Outcome::exclusion(
            "Exclusion: Not a death disposition (DISP!=20) but in denominator",
        ))
    }
}

/// PSI_04: death among surgical inpatients with serious treatable complications
///
/// The complication stratum is assigned before the death check, so a
/// surviving patient is still reported against their stratum.
pub fn psi04(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    if !ctx.drg_in(SURGICAL_DRGS) {
        return Ok(not_surgical_drg());
    }

    if !exclusions::is_obstetric(ctx.view, ctx.codes) {
        let working_age = ctx.view.age()?.is_some_and(|age| (18..=89).contains(&age));
        if !working_age {
            return Ok(Outcome::exclusion(
                "Population Exclusion: Age not 18-89 and not an obstetric patient",
            ));
        }
    }

    let first_or = ctx.first_procedure_date("ORPROC");
    if first_or.is_none() {
        return Ok(Outcome::exclusion("Denominator Exclusion: No qualifying OR procedure found"));
    }

    let early_surgery = ctx.days_from_admission(first_or).is_some_and(|days| days <= 2);
    if !(is_elective(ctx)? || early_surgery) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Not elective admission and first OR not within 2 days of admission",
        ));
    }

    if is_transfer_to_acute_care(ctx)? {
        return Ok(Outcome::exclusion(
            "Overall Exclusion: Transfer to acute care facility (Discharge_Disposition=2)",
        ));
    }
    if is_hospice_admission(ctx) {
        return Ok(Outcome::exclusion("Overall Exclusion: Admission from hospice facility"));
    }
    if exclusions::is_newborn(ctx.view, ctx.codes) {
        return Ok(Outcome::exclusion(
            "Overall Exclusion: MDC 15 - Newborn (principal dx in MDC15PRINDX)",
        ));
    }

    let Some(stratum) = strata::assign_complication_stratum(ctx.view, ctx.codes, ctx.definition, first_or)? else {
        return Ok(Outcome::exclusion(
            "Exclusion: No serious treatable complication identified",
        ));
    };
    let label = stratum.label();

    let outcome = if is_death(ctx)? {
        Outcome::inclusion(format!("Inclusion: Death among surgical inpatients with {label}"))
    } else {
        Outcome::exclusion(format!(
            "Exclusion: Not a death disposition (DISP!=20) but in {label} denominator"
        ))
    };
    Ok(outcome.with_detail("stratum", label))
}
