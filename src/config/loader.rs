//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PsiConfig;
use crate::domain::errors::PsiError;
use crate::domain::result::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex"));

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PsiConfig
/// 4. Applies environment variable overrides (PSI_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, a
/// referenced variable is unset, the TOML does not parse, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use psi_engine::config::loader::load_config;
///
/// let config = load_config("psi-engine.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PsiConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PsiError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PsiError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;
    let mut config = parse_config(&contents)?;
    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PsiError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Parses configuration text without touching the environment
pub fn parse_config(contents: &str) -> Result<PsiConfig> {
    toml::from_str(contents)
        .map_err(|e| PsiError::Configuration(format!("Failed to parse TOML: {}", e)))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in ENV_PLACEHOLDER.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PsiError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the PSI_* prefix
///
/// Variables follow the pattern `PSI_<SECTION>_<KEY>`, for example
/// `PSI_ENGINE_WORKERS` or `PSI_REFERENCE_CODE_SETS_PATH`.
fn apply_env_overrides(config: &mut PsiConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("PSI_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Reference overrides
    if let Ok(val) = std::env::var("PSI_REFERENCE_CODE_SETS_PATH") {
        config.reference.code_sets_path = val;
    }
    if let Ok(val) = std::env::var("PSI_REFERENCE_CATALOG_PATH") {
        config.reference.catalog_path = Some(val);
    }

    // Engine overrides
    if let Ok(val) = std::env::var("PSI_ENGINE_WORKERS") {
        config.engine.workers = val.parse().map_err(|_| {
            PsiError::Configuration(format!("PSI_ENGINE_WORKERS must be a number, got '{val}'"))
        })?;
    }
    if let Ok(val) = std::env::var("PSI_ENGINE_INDICATORS") {
        config.engine.indicators = split_list(&val);
    }

    // Output overrides
    if let Ok(val) = std::env::var("PSI_OUTPUT_PATH") {
        config.output.path = Some(val);
    }
    if let Ok(val) = std::env::var("PSI_OUTPUT_PRETTY") {
        config.output.pretty = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("PSI_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("PSI_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("PSI_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

/// Splits a comma-separated list, dropping blank entries
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
