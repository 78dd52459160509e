// PSI Engine - Patient Safety Indicator Classification
// Copyright (c) 2025 PSI Engine Contributors
// Licensed under the MIT License

//! # PSI Engine - Patient Safety Indicator classification
//!
//! PSI Engine classifies hospital encounter records against the Patient Safety
//! Indicator definitions PSI_02 through PSI_19. Every (encounter, indicator)
//! pair gets exactly one row: `Inclusion`, `Exclusion`, `Error` or
//! `Not Implemented`, with a human-readable rationale.
//!
//! ## Overview
//!
//! This library provides:
//! - **Reference data**: code sets and the indicator catalog, built once and shared
//! - **Encounter views**: normalized diagnoses, POA flags, procedures and dates
//! - **Base exclusions**: required fields, age floors, MDC 14/15 routing, ungroupable DRGs
//! - **Indicator evaluators**: one decision tree per indicator, dispatched by id
//! - **Batch evaluation**: many encounters on a worker pool, in input order
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Evaluation engine (views, exclusions, indicators, batch)
//! - [`reference`] - Code set registry and indicator catalog
//! - [`adapters`] - JSON file readers and writers
//! - [`domain`] - Identifiers, records, results and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use psi_engine::core::EvaluationOrchestrator;
//! use psi_engine::domain::{EncounterRecord, IndicatorId};
//! use psi_engine::reference::{CodeSetRegistry, IndicatorCatalog};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codes = CodeSetRegistry::from_lists([("LOWMODR", vec!["775"])]);
//! let catalog = IndicatorCatalog::standard()?;
//! let engine = EvaluationOrchestrator::with_standard_registry(Arc::new(codes), Arc::new(catalog));
//!
//! let record = EncounterRecord::builder()
//!     .id("E-1001")
//!     .field("AGE", 61)
//!     .field("SEX", "F")
//!     .field("MS-DRG", "775")
//!     .field("MDC", 6)
//!     .principal("K35.80", "Y")
//!     .field("Discharge_Disposition", 20)
//!     .build();
//!
//! let result = engine.evaluate(&record, 0, &IndicatorId::from_number(2));
//! println!("{}: {} ({})", result.indicator, result.status, result.reason);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Loading failures use [`domain::PsiError`]. Failures inside one evaluation
//! never abort a batch; they become an `Error` row for that pair.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod reference;
