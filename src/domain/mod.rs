//! Domain models and types for the PSI engine.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`IndicatorId`], [`EncounterId`])
//! - **Input and output models** ([`EncounterRecord`], [`EvaluationResult`], [`Outcome`])
//! - **Error types** ([`PsiError`], [`ReferenceDataError`], [`EvaluationError`])
//! - **Result type aliases** ([`Result`], [`EvalResult`])
//!
//! # Type Safety
//!
//! Identifiers are newtypes, so an indicator id cannot be passed where an
//! encounter id is expected:
//!
//! ```rust
//! use psi_engine::domain::{EncounterId, IndicatorId};
//!
//! # fn example() -> Result<(), String> {
//! let indicator = IndicatorId::new("PSI_03")?;
//! let encounter = EncounterId::new("E-1001")?;
//!
//! // let wrong: IndicatorId = encounter;  // Compile error
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Start-up failures return [`Result<T, PsiError>`]. Failures inside one
//! evaluation return [`EvalResult<T>`] and end up as an `Error` row.

pub mod context;
pub mod encounter;
pub mod errors;
pub mod evaluation;
pub mod ids;
pub mod result;

pub use encounter::{EncounterRecord, EncounterRecordBuilder};
pub use errors::{EvaluationError, PsiError, ReferenceDataError};
pub use evaluation::{EvaluationResult, EvaluationStatus, Outcome};
pub use ids::{EncounterId, IndicatorId};
pub use result::{EvalResult, Result};
