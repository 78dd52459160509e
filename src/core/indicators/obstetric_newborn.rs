//! Birth trauma (PSI_17) and obstetric trauma (PSI_18, PSI_19) indicators
//!
//! These count a diagnosis in any position and ignore POA.

use super::{no_diagnoses, IndicatorContext};
use crate::domain::evaluation::Outcome;
use crate::domain::result::EvalResult;

/// PSI_17: birth trauma, injury to neonate
pub fn psi17(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }
    if ctx.principal_in("NEWBORN").is_none() {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Not a newborn discharge (Principal DX not in NEWBORN codes)",
        ));
    }

    for dx in ctx.view.diagnoses() {
        if ctx.in_set("PRETEID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Preterm infant with birth weight < 2000g ({})",
                dx.code
            )));
        }
        if ctx.in_set("OSTEOID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Osteogenesis imperfecta diagnosis present ({})",
                dx.code
            )));
        }
    }

    if ctx.first_diagnosis_in("BIRTHID").is_some() {
        Ok(Outcome::inclusion("Inclusion: Birth trauma injury to neonate"))
    } else {
        Ok(Outcome::exclusion("Exclusion: No qualifying birth trauma injury found"))
    }
}

/// Vaginal delivery denominator shared by both obstetric trauma indicators
fn vaginal_delivery_denominator(ctx: &IndicatorContext<'_>) -> Option<Outcome> {
    if ctx.view.diagnoses().is_empty() {
        return Some(no_diagnoses());
    }
    if ctx.first_diagnosis_in("DELOCMD").is_none() {
        return Some(Outcome::exclusion(
            "Denominator Exclusion: No delivery outcome diagnosis found",
        ));
    }
    if ctx.any_procedure_in("VAGDELP").is_none() {
        return Some(Outcome::exclusion(
            "Denominator Exclusion: No vaginal delivery procedure found",
        ));
    }
    None
}

/// PSI_18: obstetric trauma, vaginal delivery with instrument
pub fn psi18(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if let Some(outcome) = vaginal_delivery_denominator(ctx) {
        return Ok(outcome);
    }
    if ctx.any_procedure_in("INSTRIP").is_none() {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: No instrument-assisted delivery procedure found",
        ));
    }

    if ctx.first_diagnosis_in("OBTRAID").is_some() {
        Ok(Outcome::inclusion(
            "Inclusion: Obstetric trauma (third or fourth degree) with instrument-assisted vaginal delivery",
        ))
    } else {
        Ok(Outcome::exclusion(
            "Exclusion: No qualifying obstetric trauma found for instrument-assisted vaginal delivery",
        ))
    }
}

/// PSI_19: obstetric trauma, vaginal delivery without instrument
pub fn psi19(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if let Some(outcome) = vaginal_delivery_denominator(ctx) {
        return Ok(outcome);
    }
    if ctx.any_procedure_in("INSTRIP").is_some() {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Instrument-assisted delivery procedure found (PSI_19 excludes these)",
        ));
    }

    if ctx.first_diagnosis_in("OBTRAID").is_some() {
        Ok(Outcome::inclusion(
            "Inclusion: Obstetric trauma (third or fourth degree) with spontaneous vaginal delivery",
        ))
    } else {
        Ok(Outcome::exclusion(
            "Exclusion: No qualifying obstetric trauma found for spontaneous vaginal delivery",
        ))
    }
}
