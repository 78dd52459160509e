//! Domain error types
//!
//! This module defines the error hierarchy for the engine. Errors raised while
//! loading reference data and errors raised while evaluating one encounter are
//! kept apart, because the first kind aborts start-up and the second kind only
//! turns a single (encounter, indicator) pair into an `Error` row.

use thiserror::Error;

/// Main engine error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum PsiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Code set or indicator catalog errors
    #[error("Reference data error: {0}")]
    ReferenceData(#[from] ReferenceDataError),

    /// Indicator evaluation errors
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while building the code set registry or the indicator catalog
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    /// Reference file does not exist
    #[error("Reference file not found: {0}")]
    NotFound(String),

    /// Reference document has an unexpected shape
    #[error("Invalid reference data format: {0}")]
    InvalidFormat(String),

    /// A code set entry is not a list of codes
    #[error("Code set '{0}' is not a list of codes")]
    NotACodeList(String),

    /// Unknown population type in an indicator definition
    #[error("Unknown population type '{value}' for indicator {indicator}")]
    UnknownPopulationType { indicator: String, value: String },

    /// Indicator identifier is not of the form PSI_NN
    #[error("Invalid indicator identifier: {0}")]
    InvalidIndicatorId(String),
}

/// Errors raised inside an indicator evaluator
///
/// These never abort a batch. The orchestrator converts them into an
/// `Error` result for the pair being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// A field holds a value that cannot be interpreted
    #[error("Malformed value '{value}' in field '{field}'")]
    MalformedField { field: String, value: String },

    /// An invariant of the evaluation was broken
    #[error("Internal evaluation failure: {0}")]
    Internal(String),

    /// The evaluator panicked; carries the panic message
    #[error("Evaluator panicked: {0}")]
    Panicked(String),
}

impl EvaluationError {
    /// Creates a malformed-field error
    pub fn malformed(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            value: value.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PsiError {
    fn from(err: std::io::Error) -> Self {
        PsiError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PsiError {
    fn from(err: serde_json::Error) -> Self {
        PsiError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PsiError {
    fn from(err: toml::de::Error) -> Self {
        PsiError::Configuration(format!("TOML parse error: {err}"))
    }
}
