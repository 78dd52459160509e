//! Hospital-acquired condition indicators
//!
//! PSI_03 (pressure ulcer), PSI_05 (retained surgical item), PSI_06
//! (iatrogenic pneumothorax), PSI_07 (CVC bloodstream infection) and PSI_08
//! (in-hospital fall with fracture). All of them count a secondary diagnosis
//! that was not present on admission.

use super::{
    no_diagnoses, not_surgical_or_medical_drg, stay_at_least, IndicatorContext, SURGICAL_OR_MEDICAL_DRGS,
};
use crate::core::strata;
use crate::domain::evaluation::Outcome;
use crate::domain::result::EvalResult;

/// PSI_03: pressure ulcer rate
pub fn psi03(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_OR_MEDICAL_DRGS) {
        return Ok(not_surgical_or_medical_drg());
    }
    if !stay_at_least(ctx, 3)? {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Length of stay less than 3 days or missing",
        ));
    }

    let Some(principal) = ctx.view.principal() else {
        return Ok(no_diagnoses());
    };
    if ctx.codes.pressure_ulcer_exclusions().contains(&principal.code) {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Principal diagnosis is pressure ulcer/DTI ({})",
            principal.code
        )));
    }

    for dx in ctx.view.diagnoses() {
        if ctx.in_set("BURNDX", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Severe burn diagnosis present ({})",
                dx.code
            )));
        }
        if ctx.in_set("EXFOLIATXD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Exfoliative skin disorder diagnosis present ({})",
                dx.code
            )));
        }
    }

    if strata::qualifying_pressure_ulcer(ctx.view, ctx.codes).is_some() {
        Ok(Outcome::inclusion(
            "Inclusion: Hospital-acquired pressure ulcer (Stage 3/4 or Unstageable)",
        ))
    } else {
        Ok(Outcome::exclusion(
            "Exclusion: No qualifying hospital-acquired pressure ulcer identified",
        ))
    }
}

/// PSI_05: retained surgical item or unretrieved device fragment
pub fn psi05(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_OR_MEDICAL_DRGS) {
        return Ok(not_surgical_or_medical_drg());
    }
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    if let Some(dx) = ctx.principal_in("FOREIID") {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Principal diagnosis is retained surgical item ({})",
            dx.code
        )));
    }
    if let Some(dx) = ctx.poa_diagnosis_in("FOREIID") {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Retained surgical item diagnosis ({}) present on admission (POA=Y)",
            dx.code
        )));
    }

    if ctx.acquired_secondary_in("FOREIID").is_some() {
        Ok(Outcome::inclusion(
            "Inclusion: Retained surgical item or unretrieved device fragment (not POA)",
        ))
    } else {
        Ok(Outcome::exclusion(
            "Exclusion: No qualifying retained surgical item or unretrieved device fragment found",
        ))
    }
}

/// PSI_06: iatrogenic pneumothorax
pub fn psi06(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_OR_MEDICAL_DRGS) {
        return Ok(not_surgical_or_medical_drg());
    }
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    for dx in ctx.view.diagnoses() {
        if ctx.in_set("IATPTXD", &dx.code) && dx.is_principal_or_poa() {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Non-traumatic pneumothorax ({}) present on admission or as principal diagnosis",
                dx.code
            )));
        }
        if ctx.in_set("CTRAUMD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Chest trauma diagnosis present ({})",
                dx.code
            )));
        }
        if ctx.in_set("PLEURAD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Pleural effusion diagnosis present ({})",
                dx.code
            )));
        }
    }

    for proc in ctx.view.procedures() {
        if ctx.in_set("THORAIP", &proc.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Thoracic surgery procedure present ({})",
                proc.code
            )));
        }
        if ctx.in_set("CARDSIP", &proc.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Trans-pleural cardiac procedure present ({})",
                proc.code
            )));
        }
    }

    if ctx.acquired_secondary_in("IATROID").is_some() {
        Ok(Outcome::inclusion("Inclusion: Iatrogenic pneumothorax (secondary, not POA)"))
    } else {
        Ok(Outcome::exclusion("Exclusion: No qualifying iatrogenic pneumothorax found"))
    }
}

/// PSI_07: central venous catheter-related bloodstream infection
pub fn psi07(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_OR_MEDICAL_DRGS) {
        return Ok(not_surgical_or_medical_drg());
    }
    if !stay_at_least(ctx, 2)? {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Length of stay less than 2 days or missing",
        ));
    }
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    for dx in ctx.view.diagnoses() {
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

    if let Some(dx) = ctx.principal_in("IDTMC3D") {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Principal diagnosis is CVC-related BSI ({})",
            dx.code
        )));
    }
    if let Some(dx) = ctx.poa_diagnosis_in("IDTMC3D") {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: CVC-related BSI diagnosis ({}) present on admission (POA=Y)",
            dx.code
        )));
    }

    if ctx.acquired_secondary_in("IDTMC3D").is_some() {
        Ok(Outcome::inclusion(
            "Inclusion: Central venous catheter-related bloodstream infection (secondary, not POA)",
        ))
    } else {
        Ok(Outcome::exclusion(
            "Exclusion: No qualifying CVC-related bloodstream infection found",
        ))
    }
}

/// PSI_08: in-hospital fall-associated fracture
///
/// Hip fracture outranks any other fracture category.
pub fn psi08(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }
    if !ctx.drg_in(SURGICAL_OR_MEDICAL_DRGS) {
        return Ok(not_surgical_or_medical_drg());
    }

    if let Some(dx) = ctx.principal_in("FXID") {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: Principal diagnosis is fracture ({})",
            dx.code
        )));
    }
    for dx in ctx.view.diagnoses() {
        if !dx.is_principal() && dx.poa.is_present_on_admission() && ctx.in_set("FXID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Secondary fracture diagnosis ({}) present on admission (POA=Y)",
                dx.code
            )));
        }
        if ctx.in_set("PROSFXID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Joint prosthesis-associated fracture present ({})",
                dx.code
            )));
        }
    }

    let fractures: Vec<&str> = ctx
        .view
        .secondaries()
        .filter(|dx| dx.poa.is_acquired() && ctx.in_set("FXID", &dx.code))
        .map(|dx| dx.code.as_str())
        .collect();

    if fractures.is_empty() {
        return Ok(Outcome::exclusion(
            "Exclusion: No qualifying in-hospital fall-associated fracture found",
        ));
    }

    if fractures.iter().any(|code| ctx.in_set("HIPFXID", code)) {
        Ok(Outcome::inclusion("Inclusion: In-hospital fall-associated Hip Fracture")
            .with_detail("fracture_category", "hip_fracture"))
    } else {
        Ok(Outcome::inclusion("Inclusion: In-hospital fall-associated Other Fracture")
            .with_detail("fracture_category", "other_fracture"))
    }
}
