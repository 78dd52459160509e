//! Abdominopelvic surgery indicators: wound dehiscence (PSI_14) and
//! accidental puncture or laceration (PSI_15)

use super::{
    no_diagnoses, not_surgical_or_medical_drg, stay_at_least, IndicatorContext, SURGICAL_OR_MEDICAL_DRGS,
};
use crate::core::strata::{self, OrganInjuryMatch};
use crate::domain::evaluation::Outcome;
use crate::domain::result::EvalResult;

/// PSI_14: postoperative wound dehiscence
///
/// The index is the earliest dated abdominopelvic procedure of either
/// approach. A reclosure is only postoperative if the last one falls after it.
pub fn psi14(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    let open = ctx.first_procedure_date("ABDOMIPOPEN");
    let other = ctx.first_procedure_date("ABDOMIPOTHER");
    let Some(index) = open.into_iter().chain(other).min() else {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: No qualifying abdominopelvic procedure found",
        ));
    };

    if !stay_at_least(ctx, 2)? {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Length of stay less than 2 days or missing",
        ));
    }

    if ctx.last_procedure_date("RECLOIP").is_some_and(|reclosure| reclosure <= index) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Reclosure procedure occurred on or before initial abdominopelvic surgery",
        ));
    }

    let on_admission = ctx
        .view
        .diagnoses()
        .iter()
        .find(|dx| dx.is_principal_or_poa() && ctx.in_set("ABWALLCD", &dx.code));
    if let Some(dx) = on_admission {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Wound dehiscence diagnosis ({}) present on admission or as principal diagnosis",
            dx.code
        )));
    }

    if ctx.any_procedure_in("RECLOIP").is_some() && ctx.acquired_secondary_in("ABWALLCD").is_some() {
        let stratum = strata::assign_surgical_approach(ctx.view, ctx.codes).as_str();
        return Ok(Outcome::inclusion(format!(
            "Inclusion: Postoperative wound dehiscence - Stratum: {stratum}"
        ))
        .with_detail("stratum", stratum));
    }

    Ok(Outcome::exclusion(
        "Exclusion: No qualifying postoperative wound dehiscence found",
    ))
}

/// PSI_15: abdominopelvic accidental puncture or laceration
///
/// Qualifying cases meet all three criteria: a secondary organ-injury
/// diagnosis not present on admission, a procedure on the same organ, and
/// that procedure 1-30 days after the first abdominopelvic procedure.
pub fn psi15(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_OR_MEDICAL_DRGS) {
        return Ok(not_surgical_or_medical_drg());
    }
    let Some(principal) = ctx.view.principal() else {
        return Ok(no_diagnoses());
    };

    let index = ctx.first_procedure_date("ABDOMI15P");
    if index.is_none() {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: No qualifying abdominopelvic procedure (ABDOMI15P) or missing date",
        ));
    }

    if ctx.codes.organ_injury_diagnoses().contains(&principal.code) {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Principal diagnosis is accidental puncture/laceration ({})",
            principal.code
        )));
    }

    match strata::match_organ_injury(ctx.view, ctx.codes, index) {
        OrganInjuryMatch::PresentOnAdmission(dx) => Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: POA accidental puncture/laceration ({}) with matching related procedure",
            dx.code
        ))),
        OrganInjuryMatch::Qualifying(_) => {
            let risk = strata::assign_procedure_complexity(ctx.view, ctx.codes, index).as_str();
            Ok(Outcome::inclusion(format!(
                "Inclusion: Abdominopelvic accidental puncture/laceration - Risk Category: {risk}"
            ))
            .with_detail("risk_category", risk))
        }
        OrganInjuryMatch::NoMatch => Ok(Outcome::exclusion(
            "Exclusion: No qualifying abdominopelvic accidental puncture/laceration found",
        )),
    }
}
