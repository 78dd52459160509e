//! Configuration management for the PSI engine.
//!
//! # Overview
//!
//! The engine reads a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PSI_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use psi_engine::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("psi-engine.toml")?;
//!
//! println!("Code sets: {}", config.reference.code_sets_path);
//! println!("Workers: {}", config.engine.workers);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ReferenceConfig`] - Code set and indicator catalog files
//! - [`EngineConfig`] - Worker count and indicator selection
//! - [`OutputConfig`] - Results file and formatting
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [reference]
//! code_sets_path = "${PSI_DATA_DIR}/code_sets.json"
//!
//! [engine]
//! workers = 4
//! indicators = ["PSI_03", "PSI_04"]
//!
//! [output]
//! path = "results.json"
//! pretty = true
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, EngineConfig, LoggingConfig, OutputConfig, PsiConfig, ReferenceConfig,
};
