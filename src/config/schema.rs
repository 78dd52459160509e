//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.

use crate::domain::ids::IndicatorId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main engine configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsiConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Reference data locations
    pub reference: ReferenceConfig,

    /// Evaluation settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Result output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PsiConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.reference.validate()?;
        self.engine.validate()?;
        self.output.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Reference data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// JSON file mapping code set names to code lists
    pub code_sets_path: String,

    /// Indicator catalog JSON; the embedded standard catalog when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
}

impl ReferenceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.code_sets_path.trim().is_empty() {
            return Err("reference.code_sets_path cannot be empty".to_string());
        }
        if self.catalog_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err("reference.catalog_path cannot be empty when set".to_string());
        }
        Ok(())
    }
}

/// Evaluation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of blocking workers (1-64)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Indicators to evaluate; empty means PSI_02 through PSI_19
    #[serde(default)]
    pub indicators: Vec<String>,
}

impl EngineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.workers == 0 || self.workers > 64 {
            return Err(format!(
                "engine.workers must be between 1 and 64, got {}",
                self.workers
            ));
        }
        self.indicator_ids()?;
        Ok(())
    }

    /// Parsed indicator ids, in configured order
    ///
    /// # Errors
    ///
    /// Returns an error naming the first entry that is not a PSI identifier
    pub fn indicator_ids(&self) -> Result<Vec<IndicatorId>, String> {
        if self.indicators.is_empty() {
            return Ok(IndicatorId::standard_range());
        }
        self.indicators
            .iter()
            .map(|raw| {
                IndicatorId::from_str(raw)
                    .map_err(|e| format!("Invalid indicator '{raw}' in engine.indicators: {e}"))
            })
            .collect()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            indicators: Vec::new(),
        }
    }
}

/// Result output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Results file; results go to stdout when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Pretty-print the JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err("output.path cannot be empty when set".to_string());
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            pretty: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path is required when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    4
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
