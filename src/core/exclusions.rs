//! Cross-indicator base exclusions
//!
//! These checks run before any indicator-specific logic, for every indicator,
//! in a fixed order. The first one that fires decides the result:
//!
//! 1. Required fields are present
//! 2. Age is valid and meets the population's floor
//! 3. MDC is a valid number
//! 4. MDC 15 newborns only reach newborn indicators
//! 5. MDC 14 obstetric cases only reach maternal indicators
//! 6. The DRG is groupable

use crate::core::encounter::EncounterView;
use crate::domain::evaluation::Outcome;
use crate::reference::{CodeSetRegistry, IndicatorDefinition, PopulationType};

/// Fields every indicator needs, in check order
pub const CORE_REQUIRED_FIELDS: [&str; 7] = ["EncounterID", "AGE", "SEX", "MS-DRG", "MDC", "Pdx", "POA1"];

const ADULT_AGE: i64 = 18;
const NEWBORN_MDC: i64 = 15;
const OBSTETRIC_MDC: i64 = 14;
const UNGROUPABLE_DRG: &str = "999";

/// Runs the base exclusions for one encounter and indicator
///
/// Returns the excluding outcome, or `None` if the encounter may proceed to
/// the indicator's own evaluator.
pub fn check(view: &EncounterView, codes: &CodeSetRegistry, definition: &IndicatorDefinition) -> Option<Outcome> {
    if let Some(field) = first_missing_field(view, definition) {
        return Some(Outcome::exclusion(format!(
            "Data Exclusion: Missing required field '{field}'"
        )));
    }

    let age = match view.age() {
        Ok(Some(age)) if age >= 0 => age,
        _ => return Some(Outcome::exclusion("Data Exclusion: Invalid or missing 'AGE'")),
    };
    if age < ADULT_AGE && applies_adult_floor(view, codes, definition) {
        return Some(Outcome::exclusion("Population Exclusion: Age < 18"));
    }

    let Ok(Some(mdc)) = view.mdc() else {
        return Some(Outcome::exclusion("Data Exclusion: Invalid MDC value"));
    };
    let population = definition.population_type;

    if mdc == NEWBORN_MDC
        && principal_in(view, codes, "MDC15PRINDX")
        && population != Some(PopulationType::NewbornOnly)
    {
        return Some(Outcome::exclusion(
            "Population Exclusion: MDC 15 - Newborn (principal dx in MDC15PRINDX)",
        ));
    }

    if mdc == OBSTETRIC_MDC
        && principal_in(view, codes, "MDC14PRINDX")
        && population != Some(PopulationType::MaternalObstetric)
    {
        return Some(Outcome::exclusion(
            "Population Exclusion: MDC 14 - Obstetric (principal dx in MDC14PRINDX)",
        ));
    }

    if view.drg().as_deref() == Some(UNGROUPABLE_DRG) {
        return Some(Outcome::exclusion("Data Exclusion: DRG is ungroupable (999)"));
    }

    None
}

/// Required fields for an indicator, in check order
pub fn required_fields(definition: &IndicatorDefinition) -> Vec<&str> {
    let mut fields: Vec<&str> = CORE_REQUIRED_FIELDS.to_vec();
    for field in &definition.required_fields {
        if !fields.contains(&field.as_str()) {
            fields.push(field.as_str());
        }
    }
    if definition.requires_procedure_timing {
        fields.extend(["Admission_Date", "Discharge_Date"]);
    }
    if definition.requires_minimum_los {
        fields.push("Length_of_stay");
    }
    fields
}

fn first_missing_field<'d>(view: &EncounterView, definition: &'d IndicatorDefinition) -> Option<&'d str> {
    required_fields(definition)
        .into_iter()
        .find(|field| !view.record().is_present(field))
}

fn applies_adult_floor(view: &EncounterView, codes: &CodeSetRegistry, definition: &IndicatorDefinition) -> bool {
    match definition.population_type {
        None | Some(PopulationType::NewbornOnly) => false,
        Some(PopulationType::Adult) => true,
        Some(_) => !(definition.obstetric_any_age && is_obstetric(view, codes)),
    }
}

/// MDC 14 with an obstetric principal diagnosis
///
/// A malformed MDC is not obstetric; the MDC check reports it afterwards.
pub fn is_obstetric(view: &EncounterView, codes: &CodeSetRegistry) -> bool {
    matches!(view.mdc(), Ok(Some(OBSTETRIC_MDC))) && principal_in(view, codes, "MDC14PRINDX")
}

/// MDC 15 with a newborn principal diagnosis
pub fn is_newborn(view: &EncounterView, codes: &CodeSetRegistry) -> bool {
    matches!(view.mdc(), Ok(Some(NEWBORN_MDC))) && principal_in(view, codes, "MDC15PRINDX")
}

fn principal_in(view: &EncounterView, codes: &CodeSetRegistry, set: &str) -> bool {
    view.principal()
        .is_some_and(|dx| codes.contains(set, &dx.code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encounter::{EncounterRecord, EncounterRecordBuilder};
    use crate::domain::ids::IndicatorId;

    fn codes() -> CodeSetRegistry {
        CodeSetRegistry::from_lists(vec![
            ("MDC14PRINDX", vec!["O80"]),
            ("MDC15PRINDX", vec!["Z38.00"]),
        ])
    }

    fn definition(population: Option<PopulationType>) -> IndicatorDefinition {
        let mut def = IndicatorDefinition::unspecified(IndicatorId::from_number(3));
        def.population_type = population;
        def
    }

    fn base() -> EncounterRecordBuilder {
        EncounterRecord::builder()
            .id("E1")
            .field("AGE", 45)
            .field("SEX", "F")
            .field("MS-DRG", "470")
            .field("MDC", 8)
            .principal("M17.11", "Y")
    }

    fn run(record: &EncounterRecord, def: &IndicatorDefinition) -> Option<String> {
        let view = EncounterView::new(record);
        check(&view, &codes(), def).map(|o| o.reason)
    }

    #[test]
    fn test_clean_encounter_passes() {
        let record = base().build();
        assert_eq!(run(&record, &definition(Some(PopulationType::Adult))), None);
    }

    #[test]
    fn test_missing_fields_in_declared_order() {
        let record = base().field("SEX", "").field("MDC", serde_json::Value::Null).build();
        assert_eq!(
            run(&record, &definition(None)).as_deref(),
            Some("Data Exclusion: Missing required field 'SEX'")
        );
    }

    #[test]
    fn test_timing_and_los_fields_are_required_when_flagged() {
        let mut def = definition(None);
        def.requires_procedure_timing = true;
        def.requires_minimum_los = true;
        let record = base().field("Admission_Date", "2024-01-01").build();
        assert_eq!(
            run(&record, &def).as_deref(),
            Some("Data Exclusion: Missing required field 'Discharge_Date'")
        );
        assert_eq!(
            required_fields(&def).last().copied(),
            Some("Length_of_stay")
        );
    }

    #[test]
    fn test_negative_age_is_invalid() {
        let record = base().field("AGE", -1).build();
        assert_eq!(
            run(&record, &definition(None)).as_deref(),
            Some("Data Exclusion: Invalid or missing 'AGE'")
        );
    }

    #[test]
    fn test_newborn_population_has_no_floor() {
        let record = base().field("AGE", 0).build();
        assert_eq!(run(&record, &definition(Some(PopulationType::NewbornOnly))), None);
        assert_eq!(
            run(&record, &definition(Some(PopulationType::SurgicalOnly))).as_deref(),
            Some("Population Exclusion: Age < 18")
        );
    }

    #[test]
    fn test_invalid_mdc() {
        let record = base().field("MDC", "abc").build();
        assert_eq!(
            run(&record, &definition(None)).as_deref(),
            Some("Data Exclusion: Invalid MDC value")
        );
    }

    #[test]
    fn test_ungroupable_drg_numeric() {
        let record = base().field("MS-DRG", 999).build();
        assert_eq!(
            run(&record, &definition(None)).as_deref(),
            Some("Data Exclusion: DRG is ungroupable (999)")
        );
    }
}
