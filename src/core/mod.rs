//! Core evaluation engine.
//!
//! # Modules
//!
//! - [`encounter`] - Typed view over a raw encounter record and date arithmetic
//! - [`exclusions`] - Cross-indicator base exclusions
//! - [`strata`] - Stratum and risk-category assignment shared by indicators
//! - [`indicators`] - One evaluator per indicator and the dispatch table
//! - [`orchestrator`] - Runs one (encounter, indicator) pair end to end
//! - [`batch`] - Concurrent evaluation of many encounters
//!
//! # Evaluation Flow
//!
//! 1. **View**: Normalize the record into diagnoses, procedures and typed fields
//! 2. **Base exclusions**: Required fields, age, MDC routing, ungroupable DRG
//! 3. **Indicator**: Denominator, exclusions and numerator for the indicator
//! 4. **Result**: One row with status, rationale and optional details
//!
//! # Example
//!
//! ```rust,no_run
//! use psi_engine::core::batch::{BatchConfig, BatchRunner};
//! use psi_engine::core::orchestrator::EvaluationOrchestrator;
//! use psi_engine::reference::{CodeSetRegistry, IndicatorCatalog};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let codes = Arc::new(CodeSetRegistry::default());
//! let catalog = Arc::new(IndicatorCatalog::standard()?);
//! let orchestrator = EvaluationOrchestrator::with_standard_registry(codes, catalog);
//!
//! let runner = BatchRunner::new(orchestrator, BatchConfig::default());
//! let output = runner.run(Vec::new()).await;
//!
//! output.summary.log_summary();
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod encounter;
pub mod exclusions;
pub mod indicators;
pub mod orchestrator;
pub mod strata;

pub use batch::{BatchConfig, BatchOutput, BatchRunner, BatchSummary};
pub use orchestrator::EvaluationOrchestrator;
