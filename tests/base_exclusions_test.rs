//! Base exclusions as seen through the orchestrator
//!
//! These run before any indicator logic, so every scenario here uses
//! encounters that would otherwise reach an evaluator.

use pretty_assertions::assert_eq;
use psi_engine::core::EvaluationOrchestrator;
use psi_engine::domain::{EncounterRecord, EncounterRecordBuilder, EvaluationStatus, IndicatorId};
use psi_engine::reference::{CodeSetRegistry, IndicatorCatalog};
use std::sync::Arc;
use test_case::test_case;

fn engine() -> EvaluationOrchestrator {
    let codes = CodeSetRegistry::from_lists(vec![
        ("SURGI2R", vec!["470"]),
        ("MEDIC2R", vec!["193"]),
        ("MDC14PRINDX", vec!["O80"]),
        ("MDC15PRINDX", vec!["Z38.00"]),
    ]);
    let catalog = IndicatorCatalog::standard().unwrap();
    EvaluationOrchestrator::with_standard_registry(Arc::new(codes), Arc::new(catalog))
}

fn complete() -> EncounterRecordBuilder {
    EncounterRecord::builder()
        .id("E-BASE")
        .field("AGE", 55)
        .field("SEX", "F")
        .field("MS-DRG", "470")
        .field("MDC", 8)
        .field("ATYPE", 3)
        .field("Admission_Date", "2024-03-01")
        .field("Discharge_Date", "2024-03-06")
        .field("Length_of_stay", 5)
        .field("Discharge_Disposition", 1)
        .principal("M17.11", "Y")
}

fn reason(record: &EncounterRecord, psi: u8) -> String {
    engine().evaluate(record, 0, &IndicatorId::from_number(psi)).reason
}

#[test_case("SEX", 5 ; "core field")]
#[test_case("MS-DRG", 5 ; "drg")]
#[test_case("Admission_Date", 12 ; "timing field")]
#[test_case("Length_of_stay", 3 ; "minimum stay field")]
#[test_case("ATYPE", 13 ; "admission type")]
#[test_case("Discharge_Disposition", 2 ; "disposition")]
fn test_missing_required_field(field: &str, psi: u8) {
    let record = complete().field(field, "").build();

    assert_eq!(
        reason(&record, psi),
        format!("Data Exclusion: Missing required field '{field}'")
    );
}

#[test]
fn test_missing_encounter_id_uses_row_position() {
    let record = complete().field("EncounterID", serde_json::Value::Null).build();

    let result = engine().evaluate(&record, 7, &IndicatorId::from_number(5));
    assert_eq!(result.encounter_id.as_str(), "Row8");
    assert_eq!(result.reason, "Data Exclusion: Missing required field 'EncounterID'");
}

#[test_case(17, "Population Exclusion: Age < 18" ; "under adult floor")]
#[test_case(-1, "Data Exclusion: Invalid or missing 'AGE'" ; "negative age")]
fn test_age_checks(age: i64, expected: &str) {
    let record = complete().field("AGE", age).build();
    assert_eq!(reason(&record, 5), expected);
}

#[test]
fn test_non_numeric_age_is_data_exclusion() {
    let record = complete().field("AGE", "fifty").build();
    assert_eq!(reason(&record, 5), "Data Exclusion: Invalid or missing 'AGE'");
}

#[test]
fn test_non_numeric_mdc_is_data_exclusion() {
    let record = complete().field("MDC", "eight").build();
    assert_eq!(reason(&record, 5), "Data Exclusion: Invalid MDC value");
}

#[test]
fn test_newborn_routed_away_from_adult_indicators() {
    let record = complete()
        .field("AGE", 0)
        .field("MDC", 15)
        .principal("Z38.00", "Y")
        .build();

    let rows = engine().evaluate_encounter(
        &record,
        0,
        &[IndicatorId::from_number(5), IndicatorId::from_number(17)],
    );
    assert_eq!(rows[0].reason, "Population Exclusion: Age < 18");
    // the newborn indicator passes the base checks and reaches its evaluator
    assert!(!rows[1].reason.starts_with("Population Exclusion"));
}

#[test]
fn test_adult_in_mdc15_routed_away() {
    let record = complete().field("MDC", 15).principal("Z38.00", "Y").build();
    assert_eq!(
        reason(&record, 5),
        "Population Exclusion: MDC 15 - Newborn (principal dx in MDC15PRINDX)"
    );
}

#[test]
fn test_obstetric_routed_to_maternal_indicators_only() {
    let record = complete().field("MDC", 14).principal("O80", "Y").build();

    assert_eq!(
        reason(&record, 5),
        "Population Exclusion: MDC 14 - Obstetric (principal dx in MDC14PRINDX)"
    );
    assert!(!reason(&record, 19).starts_with("Population Exclusion"));
}

#[test]
fn test_mdc14_without_obstetric_principal_is_not_routed() {
    let record = complete().field("MDC", 14).build();
    assert!(!reason(&record, 5).contains("MDC 14"));
}

#[test]
fn test_ungroupable_drg() {
    let record = complete().field("MS-DRG", "999").build();
    assert_eq!(reason(&record, 5), "Data Exclusion: DRG is ungroupable (999)");
}

#[test]
fn test_numeric_ungroupable_drg() {
    let record = complete().field("MS-DRG", 999).build();
    assert_eq!(reason(&record, 5), "Data Exclusion: DRG is ungroupable (999)");
}

#[test]
fn test_complete_record_reaches_evaluator() {
    let record = complete().build();
    let result = engine().evaluate(&record, 0, &IndicatorId::from_number(5));

    assert_eq!(result.status, EvaluationStatus::Exclusion);
    assert_eq!(
        result.reason,
        "Exclusion: No qualifying retained surgical item or unretrieved device fragment found"
    );
}
