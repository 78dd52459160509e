//! Postoperative complication indicators, PSI_09 to PSI_13
//!
//! Each one is anchored on the first operating-room procedure (`ORPROC`) and
//! times related procedures against it.

use super::{
    is_elective, no_diagnoses, not_surgical_drg, IndicatorContext, SURGICAL_DRGS,
};
use crate::core::encounter::DayWindow;
use crate::core::strata;
use crate::domain::evaluation::Outcome;
use crate::domain::result::EvalResult;

const LATE_SURGERY_DAYS: i64 = 10;
const RESPIRATORY_MDC: i64 = 4;

fn not_elective() -> Outcome {
    Outcome::exclusion("Denominator Exclusion: Admission not elective (ATYPE != 3)")
}

fn no_or_procedure() -> Outcome {
    Outcome::exclusion("Denominator Exclusion: No qualifying OR procedure found")
}

fn late_surgery() -> Outcome {
    Outcome::exclusion(
        "Denominator Exclusion: First OR procedure occurred 10 or more days after admission",
    )
}

/// PSI_09: postoperative hemorrhage or hematoma
pub fn psi09(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_DRGS) {
        return Ok(not_surgical_drg());
    }
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    let first_or = ctx.first_procedure_date("ORPROC");
    if first_or.is_none() {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: No qualifying OR procedure found for timing reference",
        ));
    }

    for dx in ctx.view.diagnoses() {
        if ctx.in_set("COAGDID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Coagulation disorder diagnosis present ({})",
                dx.code
            )));
        }
        if ctx.in_set("MEDBLEEDD", &dx.code) && dx.is_principal_or_poa() {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Medication-related coagulopathy ({}) present on admission or as principal diagnosis",
                dx.code
            )));
        }
    }

    let first_treatment = ctx.first_procedure_date("HEMOTH2P");
    if ctx.procedure_in_window(first_treatment, "THROMBOLYTICP", DayWindow::at_most(0)) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Thrombolytic medication before or same day as hemorrhage treatment",
        ));
    }

    if ctx.acquired_secondary_in("POHMRI2D").is_some()
        && ctx.procedure_in_window(first_or, "HEMOTH2P", DayWindow::after(0))
    {
        return Ok(Outcome::inclusion(
            "Inclusion: Postoperative hemorrhage/hematoma with treatment (secondary, not POA)",
        ));
    }

    Ok(Outcome::exclusion(
        "Exclusion: No qualifying postoperative hemorrhage/hematoma found with required treatment and timing",
    ))
}

/// PSI_10: postoperative acute kidney injury requiring dialysis
pub fn psi10(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }
    if !ctx.drg_in(SURGICAL_DRGS) {
        return Ok(not_surgical_drg());
    }
    if !is_elective(ctx)? {
        return Ok(not_elective());
    }

    let first_or = ctx.first_procedure_date("ORPROC");
    if first_or.is_none() {
        return Ok(no_or_procedure());
    }

    for dx in ctx.view.diagnoses() {
        let on_admission = dx.is_principal_or_poa();
        if on_admission && ctx.in_set("PHYSIDB", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Acute kidney failure ({}) present on admission or as principal diagnosis",
                dx.code
            )));
        }
        if on_admission && (ctx.in_set("CARDIID", &dx.code) || ctx.in_set("CARDRID", &dx.code)) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Cardiac condition ({}) present on admission or as principal diagnosis",
                dx.code
            )));
        }
        if on_admission && ctx.in_set("SHOCKID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Shock condition ({}) present on admission or as principal diagnosis",
                dx.code
            )));
        }
        if on_admission && ctx.in_set("CRENLFD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Chronic kidney disease ({}) present on admission or as principal diagnosis",
                dx.code
            )));
        }
        if dx.is_principal() && ctx.in_set("URINARYOBSID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Principal diagnosis is urinary tract obstruction ({})",
                dx.code
            )));
        }
    }

    if ctx.procedure_in_window(first_or, "DIALYIP", DayWindow::at_most(0)) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Dialysis procedure before or same day as first OR procedure",
        ));
    }
    if ctx.procedure_in_window(first_or, "DIALY2P", DayWindow::at_most(0)) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Dialysis access procedure before or same day as first OR procedure",
        ));
    }

    if ctx.poa_diagnosis_in("SOLKIDD").is_some() && ctx.any_procedure_in("PNEPHREP").is_some() {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Solitary kidney present on admission with nephrectomy procedure",
        ));
    }

    if ctx.acquired_secondary_in("PHYSIDB").is_some()
        && ctx.procedure_in_window(first_or, "DIALYIP", DayWindow::after(0))
    {
        return Ok(Outcome::inclusion(
            "Inclusion: Postoperative acute kidney injury requiring dialysis",
        ));
    }

    Ok(Outcome::exclusion(
        "Exclusion: No qualifying postoperative acute kidney injury requiring dialysis found",
    ))
}

/// PSI_11: postoperative respiratory failure
pub fn psi11(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }
    if !ctx.drg_in(SURGICAL_DRGS) {
        return Ok(not_surgical_drg());
    }
    if !is_elective(ctx)? {
        return Ok(not_elective());
    }

    let first_or = ctx.first_procedure_date("ORPROC");
    if first_or.is_none() {
        return Ok(no_or_procedure());
    }

    for dx in ctx.view.diagnoses() {
        let poa = dx.poa.is_present_on_admission();
        if ctx.in_set("ACURF3D", &dx.code) && dx.is_principal_or_poa() {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Acute respiratory failure ({}) present on admission or as principal diagnosis",
                dx.code
            )));
        }
        if poa && ctx.in_set("TRACHID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Tracheostomy diagnosis ({}) present on admission",
                dx.code
            )));
        }
        if ctx.in_set("MALHYPD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Malignant hyperthermia diagnosis present ({})",
                dx.code
            )));
        }
        if poa && ctx.in_set("NEUROMD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Neuromuscular disorder ({}) present on admission",
                dx.code
            )));
        }
        if poa && ctx.in_set("DGNEUID", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Degenerative neurological disorder ({}) present on admission",
                dx.code
            )));
        }
    }

    let or_procedures: Vec<&str> = ctx
        .view
        .procedures()
        .iter()
        .filter(|p| ctx.in_set("ORPROC", &p.code))
        .map(|p| p.code.as_str())
        .collect();
    if let [only] = or_procedures.as_slice() {
        if ctx.in_set("TRACHIP", only) {
            return Ok(Outcome::exclusion(
                "Denominator Exclusion: Only OR procedure is tracheostomy",
            ));
        }
    }

    let first_tracheostomy = ctx.first_procedure_date("TRACHIP");
    if matches!((first_tracheostomy, first_or), (Some(trach), Some(or)) if trach < or) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Tracheostomy procedure before first OR procedure",
        ));
    }

    let high_risk = ctx.view.procedures().iter().find(|p| {
        ["NUCRANP", "PRESOPP", "LUNGCIP", "LUNGTRANSP"]
            .iter()
            .any(|set| ctx.in_set(set, &p.code))
    });
    if let Some(proc) = high_risk {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: High-risk surgery procedure present ({})",
            proc.code
        )));
    }

    if ctx.view.mdc()? == Some(RESPIRATORY_MDC) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: MDC 4 (Diseases & Disorders of the Respiratory System)",
        ));
    }

    let respiratory_failure = ctx.acquired_secondary_in("ACURF2D").is_some()
        || ctx.procedure_in_window(first_or, "PR9672P", DayWindow::at_least(0))
        || ctx.procedure_in_window(first_or, "PR9671P", DayWindow::at_least(2))
        || ctx.procedure_in_window(first_or, "PR9604P", DayWindow::at_least(1));

    if respiratory_failure {
        Ok(Outcome::inclusion("Inclusion: Postoperative respiratory failure"))
    } else {
        Ok(Outcome::exclusion(
            "Exclusion: No qualifying postoperative respiratory complication found",
        ))
    }
}

/// PSI_12: perioperative pulmonary embolism or deep vein thrombosis
///
/// Heparin-induced thrombocytopenia excludes as a secondary diagnosis
/// whatever its POA flag, unlike the neighbouring POA-gated exclusions.
pub fn psi12(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_DRGS) {
        return Ok(not_surgical_drg());
    }
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    let first_or = ctx.first_procedure_date("ORPROC");
    if first_or.is_none() {
        return Ok(no_or_procedure());
    }

    if ctx.procedure_in_window(first_or, "VENACIP", DayWindow::at_most(0)) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Vena cava interruption before or same day as first OR procedure",
        ));
    }
    if ctx.procedure_in_window(first_or, "THROMP", DayWindow::at_most(0)) {
        return Ok(Outcome::exclusion(
            "Denominator Exclusion: Thrombectomy before or same day as first OR procedure",
        ));
    }
    if ctx.days_from_admission(first_or).is_some_and(|days| days >= LATE_SURGERY_DAYS) {
        return Ok(late_surgery());
    }

    for dx in ctx.view.diagnoses() {
        let dvt_pe = ctx.in_set("DEEPVIB", &dx.code) || ctx.in_set("PULMOID", &dx.code);
        if dx.is_principal() && dvt_pe {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Principal diagnosis is DVT/PE ({})",
                dx.code
            )));
        }
        if !dx.is_principal() && dvt_pe && dx.poa.is_present_on_admission() {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: DVT/PE diagnosis ({}) present on admission (POA=Y)",
                dx.code
            )));
        }
        if !dx.is_principal() && ctx.in_set("HITD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Heparin-induced thrombocytopenia ({}) present",
                dx.code
            )));
        }
        if dx.poa.is_present_on_admission() && ctx.in_set("NEURTRAD", &dx.code) {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Acute brain or spinal injury ({}) present on admission (POA=Y)",
                dx.code
            )));
        }
    }

    if let Some(proc) = ctx.any_procedure_in("ECMOP") {
        return Ok(Outcome::exclusion(format!(
            "Denominator Exclusion: ECMO procedure present ({})",
            proc.code
        )));
    }

    let acquired = ctx
        .view
        .secondaries()
        .any(|dx| dx.poa.is_acquired() && (ctx.in_set("DEEPVIB", &dx.code) || ctx.in_set("PULMOID", &dx.code)));

    if acquired {
        Ok(Outcome::inclusion(
            "Inclusion: Perioperative Pulmonary Embolism or Deep Vein Thrombosis (secondary, not POA)",
        ))
    } else {
        Ok(Outcome::exclusion("Exclusion: No qualifying perioperative DVT/PE found"))
    }
}

/// PSI_13: postoperative sepsis, with an immune-function risk category
pub fn psi13(ctx: &IndicatorContext<'_>) -> EvalResult<Outcome> {
    if !ctx.drg_in(SURGICAL_DRGS) {
        return Ok(not_surgical_drg());
    }
    if !is_elective(ctx)? {
        return Ok(not_elective());
    }
    if ctx.view.diagnoses().is_empty() {
        return Ok(no_diagnoses());
    }

    let first_or = ctx.first_procedure_date("ORPROC");
    if first_or.is_none() {
        return Ok(no_or_procedure());
    }
    if ctx.days_from_admission(first_or).is_some_and(|days| days >= LATE_SURGERY_DAYS) {
        return Ok(late_surgery());
    }

    for dx in ctx.view.diagnoses() {
        let infection = ctx.in_set("SEPTI2D", &dx.code) || ctx.in_set("INFECID", &dx.code);
        if !infection {
            continue;
        }
        if dx.is_principal() {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Principal diagnosis is sepsis or infection ({})",
                dx.code
            )));
        }
        if dx.poa.is_present_on_admission() {
            return Ok(Outcome::exclusion(format!(
                "Denominator Exclusion: Sepsis or infection diagnosis ({}) present on admission (POA=Y)",
                dx.code
            )));
        }
    }

    if ctx.acquired_secondary_in("SEPTI2D").is_none() {
        return Ok(Outcome::exclusion("Exclusion: No qualifying postoperative sepsis found"));
    }

    let risk = strata::assign_immune_risk(ctx.view, ctx.codes).as_str();
    Ok(Outcome::inclusion(format!(
        "Inclusion: Postoperative sepsis (secondary, not POA) - Risk Category: {risk}"
    ))
    .with_detail("risk_category", risk))
}
