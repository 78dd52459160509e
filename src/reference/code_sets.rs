//! Code set registry
//!
//! Named sets of ICD-10-CM diagnosis codes, ICD-10-PCS procedure codes and
//! MS-DRG values. The registry is built once from reference data and shared
//! read-only by every evaluation.
//!
//! Two cross-indicator unions are derived at construction and never rebuilt:
//! the pressure-ulcer/deep-tissue-injury principal exclusion set and the
//! organ-injury diagnosis set.

use crate::domain::errors::ReferenceDataError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Specific-site pressure ulcer set paired with the deep tissue injury set for
/// the same anatomic site
pub const PRESSURE_ULCER_SITES: [(&str, &str); 18] = [
    ("PIRELBOWD", "DTIRELBOEXD"),
    ("PILELBOWD", "DTILELBOEXD"),
    ("PIRUPBACKD", "DTIRUPBACEXD"),
    ("PILUPBACKD", "DTILUPBACEXD"),
    ("PIRLOBACKD", "DTIRLOBACEXD"),
    ("PILLOBACKD", "DTILLOBACEXD"),
    ("PISACRALD", "DTISACRAEXD"),
    ("PIRHIPD", "DTIRHIPEXD"),
    ("PILHIPD", "DTILHIPEXD"),
    ("PIRBUTTD", "DTIRBUTEXD"),
    ("PILBUTTD", "DTILBUTEXD"),
    ("PICONTIGBBHD", "DTICONTBBHEXD"),
    ("PIRANKLED", "DTIRANKLEXD"),
    ("PILANKLED", "DTILANKLEXD"),
    ("PIRHEELD", "DTIRHEELEXD"),
    ("PILHEELD", "DTILHEELEXD"),
    ("PIHEADD", "DTIHEADEXD"),
    ("PIOTHERD", "DTIOTHEREXD"),
];

/// Pressure ulcer sets with no laterality or site detail
pub const UNSPECIFIED_PRESSURE_ULCER_SETS: [&str; 7] = [
    "PINELBOWD",
    "PINBACKD",
    "PINHIPD",
    "PINBUTTD",
    "PINANKLED",
    "PINHEELD",
    "PIUNSPECD",
];

/// An organ system with its injury diagnosis set and related procedure set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganSystem {
    pub name: &'static str,
    pub diagnosis_set: &'static str,
    pub procedure_set: &'static str,
}

/// Organ systems used for accidental puncture and laceration matching
pub const ORGAN_SYSTEMS: [OrganSystem; 6] = [
    OrganSystem {
        name: "spleen",
        diagnosis_set: "SPLEEN15D",
        procedure_set: "SPLEEN15P",
    },
    OrganSystem {
        name: "adrenal",
        diagnosis_set: "ADRENAL15D",
        procedure_set: "ADRENAL15P",
    },
    OrganSystem {
        name: "vessel",
        diagnosis_set: "VESSEL15D",
        procedure_set: "VESSEL15P",
    },
    OrganSystem {
        name: "diaphragm",
        diagnosis_set: "DIAPHR15D",
        procedure_set: "DIAPHR15P",
    },
    OrganSystem {
        name: "gastrointestinal",
        diagnosis_set: "GI15D",
        procedure_set: "GI15P",
    },
    OrganSystem {
        name: "genitourinary",
        diagnosis_set: "GU15D",
        procedure_set: "GU15P",
    },
];

/// Registry set names folded into the pressure ulcer principal exclusion
static PRESSURE_ULCER_SET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:PI\w*D|DTI\w*EXD)$").expect("valid regex"));

static EMPTY_SET: Lazy<HashSet<String>> = Lazy::new(HashSet::new);

/// Canonical form of a code as stored and looked up
///
/// Trims whitespace. A bare number of one or two digits can only be an MS-DRG
/// and is zero-padded to three digits, so `4`, `"04"` and `"004"` all match.
pub fn normalize_code(raw: &str) -> String {
    let code = raw.trim();
    if !code.is_empty() && code.len() < 3 && code.bytes().all(|b| b.is_ascii_digit()) {
        format!("{code:0>3}")
    } else {
        code.to_string()
    }
}

/// Immutable mapping from code set name to its codes
#[derive(Debug, Clone, Default)]
pub struct CodeSetRegistry {
    sets: HashMap<String, HashSet<String>>,
    pressure_ulcer_exclusions: HashSet<String>,
    organ_injury_diagnoses: HashSet<String>,
}

impl CodeSetRegistry {
    /// Builds a registry from (name, codes) pairs
    ///
    /// Duplicate codes within a list are dropped and empty lists are kept.
    /// Both are reported as data-quality warnings.
    pub fn from_lists<I, N, C>(lists: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<C>)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut sets = HashMap::new();

        for (name, codes) in lists {
            let name = name.into();
            let listed = codes.len();
            let set: HashSet<String> = codes
                .into_iter()
                .map(|code| normalize_code(&code.into()))
                .collect();

            if listed == 0 {
                tracing::warn!(code_set = %name, "Code set is empty");
            } else if set.len() < listed {
                tracing::warn!(
                    code_set = %name,
                    duplicates = listed - set.len(),
                    "Code set contains duplicate codes"
                );
            }

            sets.insert(name, set);
        }

        let pressure_ulcer_exclusions = Self::derive_pressure_ulcer_exclusions(&sets);
        let organ_injury_diagnoses = Self::derive_organ_injury_diagnoses(&sets);

        tracing::debug!(
            code_sets = sets.len(),
            pressure_ulcer_codes = pressure_ulcer_exclusions.len(),
            organ_injury_codes = organ_injury_diagnoses.len(),
            "Code set registry built"
        );

        Self {
            sets,
            pressure_ulcer_exclusions,
            organ_injury_diagnoses,
        }
    }

    /// Builds a registry from a parsed JSON object of name to code list
    ///
    /// Entries whose value is not a list are skipped with a warning. Codes may
    /// be strings or numbers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the document is not an object and
    /// `NotACodeList` if a list holds something other than codes.
    pub fn from_json_value(value: &Value) -> Result<Self, ReferenceDataError> {
        let object = value.as_object().ok_or_else(|| {
            ReferenceDataError::InvalidFormat(
                "code sets must be a JSON object of name to list of codes".to_string(),
            )
        })?;

        let mut lists = Vec::with_capacity(object.len());
        for (name, entry) in object {
            let Some(items) = entry.as_array() else {
                tracing::warn!(code_set = %name, "Code set is not a list, skipping");
                continue;
            };

            let codes = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(match n.as_f64() {
                        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                        _ => n.to_string(),
                    }),
                    _ => Err(ReferenceDataError::NotACodeList(name.clone())),
                })
                .collect::<Result<Vec<String>, _>>()?;

            lists.push((name.clone(), codes));
        }

        Ok(Self::from_lists(lists))
    }

    fn derive_pressure_ulcer_exclusions(sets: &HashMap<String, HashSet<String>>) -> HashSet<String> {
        let named = PRESSURE_ULCER_SITES
            .iter()
            .flat_map(|(site, dti)| [*site, *dti])
            .chain(UNSPECIFIED_PRESSURE_ULCER_SETS);

        let matched = sets
            .keys()
            .map(String::as_str)
            .filter(|name| PRESSURE_ULCER_SET_NAME.is_match(name));

        named
            .chain(matched)
            .filter_map(|name| sets.get(name))
            .flatten()
            .cloned()
            .collect()
    }

    fn derive_organ_injury_diagnoses(sets: &HashMap<String, HashSet<String>>) -> HashSet<String> {
        ORGAN_SYSTEMS
            .iter()
            .filter_map(|organ| sets.get(organ.diagnosis_set))
            .flatten()
            .cloned()
            .collect()
    }

    /// Returns the codes of a set, or an empty set if the name is unknown
    pub fn lookup(&self, name: &str) -> &HashSet<String> {
        self.sets.get(name).unwrap_or(&EMPTY_SET)
    }

    /// Whether `code` belongs to the named set
    pub fn contains(&self, name: &str, code: &str) -> bool {
        self.lookup(name).contains(code)
    }

    /// Whether the registry defines a set with this name
    pub fn has_set(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Number of code sets
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the registry holds no code sets
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Names of the empty code sets, sorted
    pub fn empty_sets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .sets
            .iter()
            .filter(|(_, codes)| codes.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Every pressure ulcer and deep tissue injury code, for the principal
    /// diagnosis exclusion
    pub fn pressure_ulcer_exclusions(&self) -> &HashSet<String> {
        &self.pressure_ulcer_exclusions
    }

    /// Every organ-injury diagnosis code across the six organ systems
    pub fn organ_injury_diagnoses(&self) -> &HashSet<String> {
        &self.organ_injury_diagnoses
    }

    /// The organ system whose injury diagnosis set holds `code`
    pub fn organ_for_diagnosis(&self, code: &str) -> Option<&'static OrganSystem> {
        ORGAN_SYSTEMS
            .iter()
            .find(|organ| self.contains(organ.diagnosis_set, code))
    }
}
