//! Evaluation orchestrator
//!
//! Dispatches each (encounter, indicator) pair through the base exclusions and
//! then the registered evaluator, and normalizes whatever comes back into an
//! [`EvaluationResult`]. It never fails: an evaluator error or panic becomes an
//! `Error` row for that pair alone, and an unregistered indicator becomes a
//! `Not Implemented` row.

use crate::core::encounter::EncounterView;
use crate::core::exclusions;
use crate::core::indicators::{IndicatorContext, IndicatorRegistry};
use crate::domain::encounter::EncounterRecord;
use crate::domain::errors::EvaluationError;
use crate::domain::evaluation::EvaluationResult;
use crate::domain::ids::{EncounterId, IndicatorId};
use crate::log_evaluation_error;
use crate::reference::{CodeSetRegistry, IndicatorCatalog};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Shared, read-only evaluation engine
///
/// Cloning is cheap: all reference data sits behind `Arc`.
#[derive(Debug, Clone)]
pub struct EvaluationOrchestrator {
    codes: Arc<CodeSetRegistry>,
    catalog: Arc<IndicatorCatalog>,
    registry: Arc<IndicatorRegistry>,
}

impl EvaluationOrchestrator {
    /// Create an orchestrator over already loaded reference data
    pub fn new(
        codes: Arc<CodeSetRegistry>,
        catalog: Arc<IndicatorCatalog>,
        registry: Arc<IndicatorRegistry>,
    ) -> Self {
        Self {
            codes,
            catalog,
            registry,
        }
    }

    /// Orchestrator with the standard dispatch table
    pub fn with_standard_registry(codes: Arc<CodeSetRegistry>, catalog: Arc<IndicatorCatalog>) -> Self {
        Self::new(codes, catalog, Arc::new(IndicatorRegistry::standard()))
    }

    pub fn codes(&self) -> &CodeSetRegistry {
        &self.codes
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    /// Evaluate one encounter against every requested indicator
    ///
    /// Returns exactly one result per indicator, in the order given. The
    /// encounter view is built once and shared by all indicators.
    pub fn evaluate_encounter(
        &self,
        record: &EncounterRecord,
        index: usize,
        indicators: &[IndicatorId],
    ) -> Vec<EvaluationResult> {
        let encounter_id = record.encounter_id(index);
        let view = EncounterView::new(record);

        indicators
            .iter()
            .map(|indicator| self.evaluate_with_view(&view, &encounter_id, indicator))
            .collect()
    }

    /// Evaluate one encounter against a single indicator
    pub fn evaluate(&self, record: &EncounterRecord, index: usize, indicator: &IndicatorId) -> EvaluationResult {
        let encounter_id = record.encounter_id(index);
        let view = EncounterView::new(record);
        self.evaluate_with_view(&view, &encounter_id, indicator)
    }

    fn evaluate_with_view(
        &self,
        view: &EncounterView<'_>,
        encounter_id: &EncounterId,
        indicator: &IndicatorId,
    ) -> EvaluationResult {
        let definition = self.catalog.definition_or_unspecified(indicator);

        if let Some(outcome) = exclusions::check(view, &self.codes, &definition) {
            return EvaluationResult::from_outcome(encounter_id.clone(), indicator.clone(), outcome);
        }

        let Some(evaluator) = self.registry.get(indicator) else {
            tracing::debug!(
                encounter_id = %encounter_id,
                indicator = %indicator,
                "No evaluator registered"
            );
            return EvaluationResult::not_implemented(encounter_id.clone(), indicator.clone());
        };

        let ctx = IndicatorContext::new(view, &self.codes, &definition);
        let evaluated = panic::catch_unwind(AssertUnwindSafe(|| evaluator(&ctx)))
            .unwrap_or_else(|payload| Err(EvaluationError::Panicked(panic_message(payload.as_ref()))));

        match evaluated {
            Ok(outcome) => {
                tracing::trace!(
                    encounter_id = %encounter_id,
                    indicator = %indicator,
                    inclusion = outcome.is_inclusion(),
                    reason = %outcome.reason,
                    "Indicator evaluated"
                );
                EvaluationResult::from_outcome(encounter_id.clone(), indicator.clone(), outcome)
            }
            Err(e) => {
                log_evaluation_error!(encounter_id, indicator, &e);
                EvaluationResult::error(
                    encounter_id.clone(),
                    indicator.clone(),
                    format!("An error occurred during PSI evaluation: {e}"),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
