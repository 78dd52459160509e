//! File adapters around the engine.
//!
//! The engine consumes parsed values only. These adapters do the file I/O:
//!
//! - [`reference`] - Code set and indicator catalog documents
//! - [`encounters`] - Encounter records as a JSON array
//! - [`output`] - Evaluation results as JSON
//!
//! # Example
//!
//! ```rust,no_run
//! use psi_engine::adapters::{encounters, output, reference};
//!
//! # fn example() -> psi_engine::domain::Result<()> {
//! let codes = reference::load_code_sets("data/code_sets.json")?;
//! let catalog = reference::load_catalog(None)?;
//! let records = encounters::read_encounters("encounters.json")?;
//! # let results = Vec::new();
//! output::write_results("results.json", &results, true)?;
//! # Ok(())
//! # }
//! ```

pub mod encounters;
pub mod output;
pub mod reference;
