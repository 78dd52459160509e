//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Console output for interactive runs
//! - JSON-formatted log files with daily or hourly rotation
//! - Level from configuration, overridable with `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use psi_engine::logging::init_logging;
//! use psi_engine::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(encounters = 120, "Batch loaded");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an indicator evaluation that failed for one encounter
///
/// # Example
///
/// ```no_run
/// use psi_engine::log_evaluation_error;
/// use psi_engine::domain::{EncounterId, EvaluationError, IndicatorId};
///
/// let encounter_id = EncounterId::new("E-1001").unwrap();
/// let indicator = IndicatorId::from_number(7);
/// let error = EvaluationError::malformed("Length_of_stay", "three");
/// log_evaluation_error!(&encounter_id, &indicator, &error);
/// ```
#[macro_export]
macro_rules! log_evaluation_error {
    ($encounter_id:expr, $indicator:expr, $error:expr) => {
        tracing::warn!(
            encounter_id = %$encounter_id,
            indicator = %$indicator,
            error = %$error,
            "Indicator evaluation failed"
        );
    };
}

/// Log batch progress
///
/// # Example
///
/// ```no_run
/// use psi_engine::log_batch_progress;
///
/// log_batch_progress!(3, 8);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($completed:expr, $total:expr) => {
        tracing::debug!(
            completed = $completed,
            total = $total,
            progress_pct = ($completed as f64 / $total as f64 * 100.0),
            "Batch chunk completed"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{EncounterId, EvaluationError, IndicatorId};

    #[test]
    fn test_macros_expand() {
        let encounter_id = EncounterId::for_row(0);
        let indicator = IndicatorId::from_number(3);
        let error = EvaluationError::Internal("boom".to_string());
        crate::log_evaluation_error!(&encounter_id, &indicator, &error);
        crate::log_batch_progress!(1, 4);
    }
}
