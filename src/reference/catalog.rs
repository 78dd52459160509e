//! Indicator catalog
//!
//! Structured definitions for the Patient Safety Indicators: population type,
//! required fields, exclusion rule descriptors and, for PSI_04, the stratum
//! exclusion rules.
//!
//! The catalog document keeps the shape of the published indicator metadata
//! (`{"data": {"PSI_02": {...}}}`). Stratum exclusions may be written either
//! as structured rules or as the free-text sentences of the published
//! indicator documents. Free text is parsed into [`StratumExclusionRule`] values
//! here, once, so nothing downstream matches on English.
//!
//! # Examples
//!
//! ```
//! use psi_engine::domain::IndicatorId;
//! use psi_engine::reference::{IndicatorCatalog, PopulationType};
//!
//! let catalog = IndicatorCatalog::standard().unwrap();
//! let psi03 = catalog.get(&IndicatorId::from_number(3)).unwrap();
//!
//! assert_eq!(psi03.population_type, Some(PopulationType::MedicalAndSurgical));
//! assert!(psi03.requires_minimum_los);
//! ```

use crate::domain::errors::ReferenceDataError;
use crate::domain::ids::IndicatorId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Wording of the denominator age criterion that admits obstetric patients of any age
pub const OBSTETRIC_ANY_AGE: &str = "obstetric patients of any age";

const STANDARD_CATALOG: &str = include_str!("../../data/standard_catalog.json");

/// Body-system MDCs a stratum may exclude, with their published names
const STRATUM_MDC_EXCLUSIONS: [(i64, &str); 4] = [
    (4, "Respiratory"),
    (5, "Circulatory"),
    (6, "Digestive"),
    (7, "Hepatobiliary"),
];

/// A whole-sentence MDC exclusion such as `MDC 4 (Respiratory)`
static MDC_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*MDC\s+(\d{1,2})\s+\(([A-Za-z]+)(?:\s+System)?\)\s*\.?\s*$").expect("valid regex")
});

/// Population an indicator's denominator is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationType {
    Adult,
    NewbornOnly,
    MaternalObstetric,
    ElectiveSurgicalOnly,
    SurgicalOnly,
    AbdominopelvicSurgical,
    MedicalAndSurgical,
}

impl PopulationType {
    /// Returns the catalog spelling of the population type
    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationType::Adult => "adult",
            PopulationType::NewbornOnly => "newborn_only",
            PopulationType::MaternalObstetric => "maternal_obstetric",
            PopulationType::ElectiveSurgicalOnly => "elective_surgical_only",
            PopulationType::SurgicalOnly => "surgical_only",
            PopulationType::AbdominopelvicSurgical => "abdominopelvic_surgical",
            PopulationType::MedicalAndSurgical => "medical_and_surgical",
        }
    }
}

impl fmt::Display for PopulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PopulationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adult" => Ok(PopulationType::Adult),
            "newborn_only" => Ok(PopulationType::NewbornOnly),
            "maternal_obstetric" => Ok(PopulationType::MaternalObstetric),
            "elective_surgical_only" => Ok(PopulationType::ElectiveSurgicalOnly),
            "surgical_only" => Ok(PopulationType::SurgicalOnly),
            "abdominopelvic_surgical" => Ok(PopulationType::AbdominopelvicSurgical),
            "medical_and_surgical" => Ok(PopulationType::MedicalAndSurgical),
            other => Err(format!("unknown population type: {other}")),
        }
    }
}

/// A stratum exclusion, decided when the catalog is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StratumExclusionRule {
    /// The principal diagnosis belongs to the set
    PrincipalDiagnosisIn { code_set: String },
    /// Any diagnosis, principal or secondary, belongs to the set
    AnyDiagnosisIn { code_set: String },
    /// The encounter's MDC equals the value
    MdcEquals { mdc: i64 },
    /// Diagnoses from both sets are present
    CompoundCodeSetPair { first: String, second: String },
    /// Any procedure belongs to the set
    ProcedurePresent { code_set: String },
}

impl StratumExclusionRule {
    /// Parses a published free-text stratum exclusion
    ///
    /// Returns `None` for wording that has no structured equivalent.
    ///
    /// # Examples
    ///
    /// ```
    /// use psi_engine::reference::StratumExclusionRule;
    ///
    /// let rule = StratumExclusionRule::parse("Principal diagnosis of FTR5DX* (shock)");
    /// assert_eq!(
    ///     rule,
    ///     Some(StratumExclusionRule::PrincipalDiagnosisIn { code_set: "FTR5DX".to_string() })
    /// );
    ///
    /// let rule = StratumExclusionRule::parse("MDC 4 (Respiratory)");
    /// assert_eq!(rule, Some(StratumExclusionRule::MdcEquals { mdc: 4 }));
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(code_set) = code_set_after(text, "Principal diagnosis of ") {
            return Some(StratumExclusionRule::PrincipalDiagnosisIn { code_set });
        }
        if let Some(code_set) = code_set_after(text, "Any diagnosis of ") {
            return Some(StratumExclusionRule::AnyDiagnosisIn { code_set });
        }
        if text.contains("Esophageal varices with bleeding") {
            return Some(StratumExclusionRule::CompoundCodeSetPair {
                first: "FTR6GV".to_string(),
                second: "FTR6QD".to_string(),
            });
        }
        if text.contains("Any procedure for lung cancer") {
            return Some(StratumExclusionRule::ProcedurePresent {
                code_set: "LUNGCIP".to_string(),
            });
        }
        let caps = MDC_RULE.captures(text)?;
        let mdc: i64 = caps[1].parse().ok()?;
        STRATUM_MDC_EXCLUSIONS
            .iter()
            .any(|&(number, name)| number == mdc && name == &caps[2])
            .then_some(StratumExclusionRule::MdcEquals { mdc })
    }
}

/// First word after `marker`, with parentheses and wildcards removed
fn code_set_after(text: &str, marker: &str) -> Option<String> {
    let (_, rest) = text.split_once(marker)?;
    let token: String = rest
        .split_whitespace()
        .next()?
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '*'))
        .collect();
    (!token.is_empty()).then_some(token)
}

/// One stratum of a stratified indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratumDefinition {
    pub name: String,
    pub priority: u32,
    pub exclusions: Vec<StratumExclusionRule>,
}

/// A denominator exclusion as published: category plus rule text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRuleDescriptor {
    pub category: String,
    pub description: String,
}

/// Structured definition of one indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorDefinition {
    pub id: IndicatorId,
    /// `None` means no age floor applies
    pub population_type: Option<PopulationType>,
    /// Fields beyond the core set that must be present
    pub required_fields: Vec<String>,
    pub requires_procedure_timing: bool,
    pub requires_minimum_los: bool,
    pub exclusion_rules: Vec<ExclusionRuleDescriptor>,
    /// Obstetric encounters are exempt from the adult age floor
    pub obstetric_any_age: bool,
    /// Strata in ascending priority order
    pub strata: Vec<StratumDefinition>,
}

impl IndicatorDefinition {
    /// Definition used for an indicator missing from the catalog
    pub fn unspecified(id: IndicatorId) -> Self {
        Self {
            id,
            population_type: None,
            required_fields: Vec::new(),
            requires_procedure_timing: false,
            requires_minimum_los: false,
            exclusion_rules: Vec::new(),
            obstetric_any_age: false,
            strata: Vec::new(),
        }
    }

    /// Looks up a stratum by name
    pub fn stratum(&self, name: &str) -> Option<&StratumDefinition> {
        self.strata.iter().find(|s| s.name == name)
    }
}

/// Immutable mapping from indicator id to definition
#[derive(Debug, Clone, Default)]
pub struct IndicatorCatalog {
    definitions: HashMap<IndicatorId, IndicatorDefinition>,
}

impl IndicatorCatalog {
    /// Loads the standard catalog embedded in the binary
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded document is malformed
    pub fn standard() -> Result<Self, ReferenceDataError> {
        Self::from_json_str(STANDARD_CATALOG)
    }

    /// Parses a catalog document
    pub fn from_json_str(content: &str) -> Result<Self, ReferenceDataError> {
        let raw: RawCatalog = serde_json::from_str(content)
            .map_err(|e| ReferenceDataError::InvalidFormat(format!("indicator catalog: {e}")))?;
        Self::from_raw(raw)
    }

    /// Converts an already parsed catalog document
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ReferenceDataError> {
        let raw: RawCatalog = serde_json::from_value(value)
            .map_err(|e| ReferenceDataError::InvalidFormat(format!("indicator catalog: {e}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawCatalog) -> Result<Self, ReferenceDataError> {
        let mut definitions = HashMap::with_capacity(raw.data.len());

        for (key, raw_def) in raw.data {
            let id = IndicatorId::new(&key)
                .map_err(|_| ReferenceDataError::InvalidIndicatorId(key.clone()))?;
            let definition = raw_def.into_definition(id.clone())?;
            definitions.insert(id, definition);
        }

        tracing::debug!(indicators = definitions.len(), "Indicator catalog loaded");

        Ok(Self { definitions })
    }

    /// Returns the definition for an indicator
    pub fn get(&self, id: &IndicatorId) -> Option<&IndicatorDefinition> {
        self.definitions.get(id)
    }

    /// Returns the definition, or the unspecified definition if absent
    pub fn definition_or_unspecified(&self, id: &IndicatorId) -> IndicatorDefinition {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| IndicatorDefinition::unspecified(id.clone()))
    }

    /// Indicator ids in the catalog, sorted
    pub fn ids(&self) -> Vec<IndicatorId> {
        let mut ids: Vec<IndicatorId> = self.definitions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    data: BTreeMap<String, RawDefinition>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDefinition {
    #[serde(default)]
    indicator: RawIndicator,
    #[serde(default)]
    exclusion_criteria: Vec<RawExclusionGroup>,
    #[serde(default)]
    denominator: RawDenominator,
    #[serde(default)]
    strata_definitions: BTreeMap<String, RawStratum>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIndicator {
    population_type: Option<String>,
    #[serde(default)]
    requires_procedure_timing: bool,
    #[serde(default)]
    requires_time_windows: bool,
    #[serde(default)]
    requires_minimum_los: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawExclusionGroup {
    #[serde(default)]
    category: String,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRule {
    #[serde(default)]
    description: String,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawDenominator {
    #[serde(default)]
    inclusion_criteria: Vec<RawCriterion>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCriterion {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawStratum {
    priority: Option<u32>,
    #[serde(default)]
    exclusion_criteria: Vec<RawStratumRule>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStratumRule {
    Structured(StratumExclusionRule),
    Text(String),
}

impl RawDefinition {
    fn into_definition(self, id: IndicatorId) -> Result<IndicatorDefinition, ReferenceDataError> {
        let population_type = self
            .indicator
            .population_type
            .as_deref()
            .map(|value| {
                value
                    .parse::<PopulationType>()
                    .map_err(|_| ReferenceDataError::UnknownPopulationType {
                        indicator: id.to_string(),
                        value: value.to_string(),
                    })
            })
            .transpose()?;

        let mut required_fields = Vec::new();
        let mut exclusion_rules = Vec::new();
        for group in self.exclusion_criteria {
            for rule in group.rules {
                if group.category == "data_quality" && rule.description == "Missing required fields" {
                    for field in &rule.fields {
                        if !required_fields.contains(&field.name) {
                            required_fields.push(field.name.clone());
                        }
                    }
                }
                exclusion_rules.push(ExclusionRuleDescriptor {
                    category: group.category.clone(),
                    description: rule.description,
                });
            }
        }

        let obstetric_any_age = population_type == Some(PopulationType::MaternalObstetric)
            || obstetric_age_allowance(&id, &self.denominator.inclusion_criteria);

        let mut strata: Vec<StratumDefinition> = self
            .strata_definitions
            .into_iter()
            .map(|(name, raw)| {
                let exclusions = raw
                    .exclusion_criteria
                    .into_iter()
                    .filter_map(|rule| match rule {
                        RawStratumRule::Structured(rule) => Some(rule),
                        RawStratumRule::Text(text) => {
                            let parsed = StratumExclusionRule::parse(&text);
                            if parsed.is_none() {
                                tracing::warn!(
                                    indicator = %id,
                                    stratum = %name,
                                    rule = %text,
                                    "Unrecognised stratum exclusion rule, ignoring"
                                );
                            }
                            parsed
                        }
                    })
                    .collect();
                StratumDefinition {
                    priority: raw.priority.unwrap_or(u32::MAX),
                    name,
                    exclusions,
                }
            })
            .collect();
        strata.sort_by_key(|s| s.priority);

        Ok(IndicatorDefinition {
            id,
            population_type,
            required_fields,
            requires_procedure_timing: self.indicator.requires_procedure_timing
                || self.indicator.requires_time_windows,
            requires_minimum_los: self.indicator.requires_minimum_los,
            exclusion_rules,
            obstetric_any_age,
            strata,
        })
    }
}

/// Whether the age criteria grant obstetric patients any age
///
/// Only the exact published wording counts. Other age criteria that mention
/// obstetric patients are reported and grant nothing.
fn obstetric_age_allowance(id: &IndicatorId, criteria: &[RawCriterion]) -> bool {
    let mut allowed = false;
    for criterion in criteria.iter().filter(|c| c.kind == "age") {
        if criterion.description == OBSTETRIC_ANY_AGE {
            allowed = true;
        } else if criterion.description.to_lowercase().contains("obstetric") {
            tracing::warn!(
                indicator = %id,
                criterion = %criterion.description,
                "Ambiguous obstetric age criterion, no age exemption granted"
            );
        }
    }
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_standard_catalog_covers_all_indicators() {
        let catalog = IndicatorCatalog::standard().unwrap();
        assert_eq!(catalog.ids(), IndicatorId::standard_range());
    }

    #[test]
    fn test_standard_population_types() {
        let catalog = IndicatorCatalog::standard().unwrap();
        let population = |n: u8| {
            catalog
                .get(&IndicatorId::from_number(n))
                .and_then(|d| d.population_type)
        };

        assert_eq!(population(2), Some(PopulationType::Adult));
        assert_eq!(population(12), Some(PopulationType::SurgicalOnly));
        assert_eq!(population(13), Some(PopulationType::ElectiveSurgicalOnly));
        assert_eq!(population(15), Some(PopulationType::AbdominopelvicSurgical));
        assert_eq!(population(17), Some(PopulationType::NewbornOnly));
        assert_eq!(population(18), Some(PopulationType::MaternalObstetric));
    }

    #[test]
    fn test_obstetric_any_age_grants() {
        let catalog = IndicatorCatalog::standard().unwrap();
        let grants = |n: u8| {
            catalog
                .get(&IndicatorId::from_number(n))
                .map(|d| d.obstetric_any_age)
                .unwrap_or(false)
        };

        assert!(grants(4));
        assert!(grants(18));
        assert!(grants(19));
        assert!(!grants(3));
        assert!(!grants(13));
    }

    #[test]
    fn test_psi04_strata_are_parsed_in_priority_order() {
        let catalog = IndicatorCatalog::standard().unwrap();
        let psi04 = catalog.get(&IndicatorId::from_number(4)).unwrap();

        let names: Vec<&str> = psi04.strata.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "STRATUM_SHOCK",
                "STRATUM_SEPSIS",
                "STRATUM_PNEUMONIA",
                "STRATUM_GI_HEMORRHAGE",
                "STRATUM_DVT_PE"
            ]
        );

        let gi = psi04.stratum("STRATUM_GI_HEMORRHAGE").unwrap();
        assert!(gi.exclusions.contains(&StratumExclusionRule::CompoundCodeSetPair {
            first: "FTR6GV".to_string(),
            second: "FTR6QD".to_string(),
        }));
        assert!(gi.exclusions.contains(&StratumExclusionRule::MdcEquals { mdc: 7 }));

        let pneumonia = psi04.stratum("STRATUM_PNEUMONIA").unwrap();
        assert!(pneumonia.exclusions.contains(&StratumExclusionRule::ProcedurePresent {
            code_set: "LUNGCIP".to_string()
        }));
    }

    #[test]
    fn test_parse_rule_strips_wildcards() {
        assert_eq!(
            StratumExclusionRule::parse("Any diagnosis of (TRAUMID*) trauma"),
            Some(StratumExclusionRule::AnyDiagnosisIn {
                code_set: "TRAUMID".to_string()
            })
        );
        assert_eq!(StratumExclusionRule::parse("Transfers from another hospital"), None);
    }

    #[test]
    fn test_parse_mdc_rule_needs_the_named_sentence() {
        assert_eq!(
            StratumExclusionRule::parse("MDC 7 (Hepatobiliary)"),
            Some(StratumExclusionRule::MdcEquals { mdc: 7 })
        );
        assert_eq!(
            StratumExclusionRule::parse("MDC 4 (Respiratory System)."),
            Some(StratumExclusionRule::MdcEquals { mdc: 4 })
        );
        assert_eq!(StratumExclusionRule::parse("Transfers into MDC 5 units"), None);
        assert_eq!(StratumExclusionRule::parse("MDC 5 (Digestive)"), None);
        assert_eq!(StratumExclusionRule::parse("MDC 14 (Pregnancy)"), None);
    }

    #[test]
    fn test_required_fields_and_flags() {
        let catalog = IndicatorCatalog::from_json_value(json!({
            "data": {
                "PSI_07": {
                    "indicator": {
                        "population_type": "medical_and_surgical",
                        "requires_time_windows": true,
                        "requires_minimum_los": true
                    },
                    "exclusion_criteria": [
                        {
                            "category": "data_quality",
                            "rules": [
                                {"description": "Missing required fields", "fields": [{"name": "SEX"}, {"name": "Birth_Weight"}]}
                            ]
                        },
                        {
                            "category": "clinical",
                            "rules": [{"description": "Cancer (CANCEID*)"}]
                        }
                    ]
                }
            }
        }))
        .unwrap();

        let def = catalog.get(&IndicatorId::from_number(7)).unwrap();
        assert_eq!(def.required_fields, vec!["SEX".to_string(), "Birth_Weight".to_string()]);
        assert!(def.requires_procedure_timing);
        assert!(def.requires_minimum_los);
        assert_eq!(def.exclusion_rules.len(), 2);
        assert_eq!(def.exclusion_rules[1].category, "clinical");
    }

    #[test]
    fn test_structured_stratum_rules_are_accepted() {
        let catalog = IndicatorCatalog::from_json_value(json!({
            "data": {
                "PSI_04": {
                    "strata_definitions": {
                        "STRATUM_SEPSIS": {
                            "priority": 2,
                            "exclusion_criteria": [
                                {"kind": "principal_diagnosis_in", "code_set": "INFECID"},
                                "MDC 5 (Circulatory)"
                            ]
                        }
                    }
                }
            }
        }))
        .unwrap();

        let sepsis = catalog
            .get(&IndicatorId::from_number(4))
            .and_then(|d| d.stratum("STRATUM_SEPSIS"))
            .unwrap();
        assert_eq!(
            sepsis.exclusions,
            vec![
                StratumExclusionRule::PrincipalDiagnosisIn {
                    code_set: "INFECID".to_string()
                },
                StratumExclusionRule::MdcEquals { mdc: 5 },
            ]
        );
    }

    #[test]
    fn test_unknown_population_type_is_an_error() {
        let err = IndicatorCatalog::from_json_value(json!({
            "data": {"PSI_02": {"indicator": {"population_type": "pediatric"}}}
        }))
        .unwrap_err();

        assert!(matches!(
            err,
            ReferenceDataError::UnknownPopulationType { ref value, .. } if value == "pediatric"
        ));
    }

    #[test]
    fn test_invalid_indicator_key() {
        let err = IndicatorCatalog::from_json_value(json!({"data": {"PQI_01": {}}})).unwrap_err();
        assert!(matches!(err, ReferenceDataError::InvalidIndicatorId(_)));
    }

    #[test]
    fn test_ambiguous_obstetric_wording_grants_nothing() {
        let catalog = IndicatorCatalog::from_json_value(json!({
            "data": {
                "PSI_09": {
                    "indicator": {"population_type": "surgical_only"},
                    "denominator": {"inclusion_criteria": [
                        {"type": "age", "description": "18 years and older, or obstetric"}
                    ]}
                }
            }
        }))
        .unwrap();

        assert!(!catalog.get(&IndicatorId::from_number(9)).unwrap().obstetric_any_age);
    }

    #[test]
    fn test_unspecified_definition() {
        let catalog = IndicatorCatalog::default();
        let def = catalog.definition_or_unspecified(&IndicatorId::from_number(16));
        assert_eq!(def.population_type, None);
        assert!(def.required_fields.is_empty());
    }
}
