//! Batch evaluation over many encounters
//!
//! The runner splits the input into contiguous chunks, one per worker, and
//! evaluates each chunk on the blocking thread pool. Evaluation is CPU-bound
//! and shares only immutable reference data, so chunks need no coordination.
//! Rows are reassembled in input order.

use crate::core::orchestrator::EvaluationOrchestrator;
use crate::domain::encounter::EncounterRecord;
use crate::domain::evaluation::{EvaluationResult, EvaluationStatus};
use crate::domain::ids::IndicatorId;
use crate::log_batch_progress;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of blocking workers (at least 1)
    pub workers: usize,
    /// Indicators evaluated for every encounter, in output order
    pub indicators: Vec<IndicatorId>,
}

impl BatchConfig {
    /// Create a new batch configuration
    pub fn new(workers: usize, indicators: Vec<IndicatorId>) -> Self {
        Self {
            workers: workers.max(1),
            indicators,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(4, IndicatorId::standard_range())
    }
}

/// Rows and summary of a finished run
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// One row per (encounter, indicator), encounter-major in input order
    pub results: Vec<EvaluationResult>,
    pub summary: BatchSummary,
}

/// Runs the orchestrator over a batch of encounters
#[derive(Debug, Clone)]
pub struct BatchRunner {
    orchestrator: EvaluationOrchestrator,
    config: BatchConfig,
}

impl BatchRunner {
    /// Create a new batch runner
    pub fn new(orchestrator: EvaluationOrchestrator, config: BatchConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Evaluate every encounter against every configured indicator
    ///
    /// Always returns `encounters.len() * indicators.len()` rows. Evaluator
    /// panics are contained per pair by the orchestrator; a worker task that
    /// still fails to join yields `Error` rows for every pair in its chunk.
    pub async fn run(&self, encounters: Vec<EncounterRecord>) -> BatchOutput {
        let start = Instant::now();
        let records = Arc::new(encounters);
        let indicators = Arc::new(self.config.indicators.clone());
        let chunks = chunk_ranges(records.len(), self.config.workers);
        let chunk_count = chunks.len();

        tracing::info!(
            encounters = records.len(),
            indicators = indicators.len(),
            workers = chunk_count,
            "Starting batch evaluation"
        );

        let handles = chunks.iter().cloned().enumerate().map(|(chunk_index, range)| {
            let orchestrator = self.orchestrator.clone();
            let records = Arc::clone(&records);
            let indicators = Arc::clone(&indicators);

            tokio::task::spawn_blocking(move || {
                let rows = evaluate_chunk(&orchestrator, &records, range, &indicators);
                log_batch_progress!(chunk_index + 1, chunk_count);
                rows
            })
        });
        let joined = join_all(handles).await;

        let mut results = Vec::with_capacity(records.len() * indicators.len());
        for (range, outcome) in chunks.into_iter().zip(joined) {
            match outcome {
                Ok(rows) => results.extend(rows),
                Err(e) => {
                    tracing::error!(
                        first_encounter = range.start,
                        encounters = range.len(),
                        error = %e,
                        "Batch worker failed"
                    );
                    results.extend(failed_chunk(&records, range, &indicators, &e.to_string()));
                }
            }
        }

        let summary = BatchSummary::from_results(records.len(), &results).with_duration(start.elapsed());
        BatchOutput { results, summary }
    }
}

fn evaluate_chunk(
    orchestrator: &EvaluationOrchestrator,
    records: &[EncounterRecord],
    range: Range<usize>,
    indicators: &[IndicatorId],
) -> Vec<EvaluationResult> {
    let mut rows = Vec::with_capacity(range.len() * indicators.len());
    for index in range {
        if let Some(record) = records.get(index) {
            rows.extend(orchestrator.evaluate_encounter(record, index, indicators));
        }
    }
    rows
}

fn failed_chunk(
    records: &[EncounterRecord],
    range: Range<usize>,
    indicators: &[IndicatorId],
    message: &str,
) -> Vec<EvaluationResult> {
    let reason = format!("An error occurred during PSI evaluation: {message}");
    let mut rows = Vec::with_capacity(range.len() * indicators.len());
    for index in range {
        let Some(record) = records.get(index) else {
            continue;
        };
        let encounter_id = record.encounter_id(index);
        for indicator in indicators {
            rows.push(EvaluationResult::error(encounter_id.clone(), indicator.clone(), reason.clone()));
        }
    }
    rows
}

/// Splits `len` items into at most `workers` contiguous, non-empty ranges
fn chunk_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let size = len.div_ceil(workers.max(1));
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Status counts for a batch run
///
/// Counts only. Rates are left to downstream reporting.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Number of encounters in the input
    pub total_encounters: usize,

    /// Number of result rows produced
    pub total_rows: usize,

    /// Rows per status
    pub by_status: BTreeMap<EvaluationStatus, usize>,

    /// Rows per indicator and status
    pub by_indicator: BTreeMap<IndicatorId, BTreeMap<EvaluationStatus, usize>>,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl BatchSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally a set of result rows
    pub fn from_results(total_encounters: usize, results: &[EvaluationResult]) -> Self {
        let mut summary = Self {
            total_encounters,
            ..Self::default()
        };
        for result in results {
            summary.record(result);
        }
        summary
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Count one row
    pub fn record(&mut self, result: &EvaluationResult) {
        self.total_rows += 1;
        *self.by_status.entry(result.status).or_default() += 1;
        *self
            .by_indicator
            .entry(result.indicator.clone())
            .or_default()
            .entry(result.status)
            .or_default() += 1;
    }

    /// Rows with the given status
    pub fn count(&self, status: EvaluationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Rows for one indicator with the given status
    pub fn indicator_count(&self, indicator: &IndicatorId, status: EvaluationStatus) -> usize {
        self.by_indicator
            .get(indicator)
            .and_then(|counts| counts.get(&status))
            .copied()
            .unwrap_or(0)
    }

    /// Check if any pair failed to evaluate
    pub fn has_errors(&self) -> bool {
        self.count(EvaluationStatus::Error) > 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_encounters = self.total_encounters,
            total_rows = self.total_rows,
            inclusions = self.count(EvaluationStatus::Inclusion),
            exclusions = self.count(EvaluationStatus::Exclusion),
            errors = self.count(EvaluationStatus::Error),
            not_implemented = self.count(EvaluationStatus::NotImplemented),
            duration_ms = self.duration.as_millis(),
            "Batch evaluation completed"
        );

        for (indicator, counts) in &self.by_indicator {
            tracing::debug!(
                indicator = %indicator,
                inclusions = counts.get(&EvaluationStatus::Inclusion).copied().unwrap_or(0),
                exclusions = counts.get(&EvaluationStatus::Exclusion).copied().unwrap_or(0),
                errors = counts.get(&EvaluationStatus::Error).copied().unwrap_or(0),
                "Indicator summary"
            );
        }

        if self.has_errors() {
            tracing::warn!(
                error_count = self.count(EvaluationStatus::Error),
                "Batch completed with evaluation errors"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{CodeSetRegistry, IndicatorCatalog};

    fn runner(workers: usize, indicators: Vec<IndicatorId>) -> BatchRunner {
        let orchestrator = EvaluationOrchestrator::with_standard_registry(
            Arc::new(CodeSetRegistry::from_lists([("LOWMODR", vec!["775"])])),
            Arc::new(IndicatorCatalog::standard().unwrap()),
        );
        BatchRunner::new(orchestrator, BatchConfig::new(workers, indicators))
    }

    fn encounter(id: &str) -> EncounterRecord {
        EncounterRecord::builder()
            .id(id)
            .field("AGE", 40)
            .field("SEX", "M")
            .field("MS-DRG", "775")
            .field("MDC", 5)
            .principal("I10", "Y")
            .field("Discharge_Disposition", 1)
            .build()
    }

    #[test]
    fn test_chunk_ranges_cover_input() {
        assert_eq!(chunk_ranges(7, 3), vec![0..3, 3..6, 6..7]);
        assert_eq!(chunk_ranges(2, 8), vec![0..1, 1..2]);
        assert_eq!(chunk_ranges(5, 1), vec![0..5]);
        assert!(chunk_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_batch_config_clamps_workers() {
        assert_eq!(BatchConfig::new(0, vec![]).workers, 1);
        assert_eq!(BatchConfig::default().indicators.len(), 18);
    }

    #[tokio::test]
    async fn test_run_preserves_input_order() {
        let indicators = vec![IndicatorId::from_number(2), IndicatorId::from_number(16)];
        let encounters: Vec<EncounterRecord> = (0..7).map(|i| encounter(&format!("E{i}"))).collect();

        let output = runner(3, indicators.clone()).run(encounters).await;

        assert_eq!(output.results.len(), 14);
        for (i, pair) in output.results.chunks(2).enumerate() {
            assert_eq!(pair[0].encounter_id.as_str(), format!("E{i}"));
            assert_eq!(pair[0].indicator, indicators[0]);
            assert_eq!(pair[1].indicator, indicators[1]);
        }
        assert_eq!(output.summary.total_encounters, 7);
        assert_eq!(output.summary.count(EvaluationStatus::NotImplemented), 7);
    }

    #[tokio::test]
    async fn test_run_empty_batch() {
        let output = runner(4, IndicatorId::standard_range()).run(Vec::new()).await;
        assert!(output.results.is_empty());
        assert_eq!(output.summary.total_rows, 0);
    }

    #[test]
    fn test_failed_chunk_yields_error_rows() {
        let records = vec![encounter("A"), encounter("B")];
        let indicators = IndicatorId::standard_range();
        let rows = failed_chunk(&records, 1..2, &indicators, "worker panicked");

        assert_eq!(rows.len(), 18);
        assert!(rows.iter().all(|row| row.status == EvaluationStatus::Error));
        assert!(rows.iter().all(|row| row.encounter_id.as_str() == "B"));
        assert!(rows[0].reason.ends_with("worker panicked"));
    }

    #[test]
    fn test_summary_counts() {
        let rows = vec![
            EvaluationResult::not_implemented(
                crate::domain::ids::EncounterId::for_row(0),
                IndicatorId::from_number(16),
            ),
            EvaluationResult::error(
                crate::domain::ids::EncounterId::for_row(0),
                IndicatorId::from_number(2),
                "boom",
            ),
        ];
        let summary = BatchSummary::from_results(1, &rows);

        assert_eq!(summary.total_rows, 2);
        assert!(summary.has_errors());
        assert_eq!(
            summary.indicator_count(&IndicatorId::from_number(2), EvaluationStatus::Error),
            1
        );
        assert_eq!(summary.count(EvaluationStatus::Inclusion), 0);
    }
}
