//! Reference data for indicator evaluation.
//!
//! - [`CodeSetRegistry`] maps code set names to codes, with the derived
//!   pressure-ulcer and organ-injury unions.
//! - [`IndicatorCatalog`] maps indicator ids to their structured definitions.
//!
//! Both are built once and shared read-only, typically behind an `Arc`.

pub mod catalog;
pub mod code_sets;

pub use catalog::{
    ExclusionRuleDescriptor, IndicatorCatalog, IndicatorDefinition, PopulationType,
    StratumDefinition, StratumExclusionRule,
};
pub use code_sets::{normalize_code, CodeSetRegistry, OrganSystem, ORGAN_SYSTEMS, PRESSURE_ULCER_SITES};
