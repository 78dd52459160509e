//! Evaluate command implementation
//!
//! This module implements the `evaluate` command, which classifies a file of
//! encounters against the configured indicators and writes one row per
//! (encounter, indicator) pair.

use crate::adapters::{encounters, output, reference};
use crate::config::loader::split_list;
use crate::config::{load_config, PsiConfig};
use crate::core::batch::{BatchConfig, BatchRunner, BatchSummary};
use crate::core::orchestrator::EvaluationOrchestrator;
use crate::domain::evaluation::EvaluationStatus;
use crate::domain::ids::IndicatorId;
use anyhow::Context;
use clap::Args;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Arguments for the evaluate command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// JSON file holding an array of encounter records
    #[arg(short, long)]
    pub encounters: String,

    /// Override indicator(s) to evaluate (comma-separated)
    #[arg(long)]
    pub indicators: Option<String>,

    /// Override the results file; results go to stdout when neither this nor
    /// output.path is set
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override the number of workers
    #[arg(long)]
    pub workers: Option<usize>,
}

impl EvaluateArgs {
    /// Execute the evaluate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(encounters = %self.encounters, "Starting evaluate command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let indicators = match self.resolve_indicators(&config) {
            Ok(ids) => ids,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let workers = self.workers.unwrap_or(config.engine.workers);
        if workers == 0 || workers > 64 {
            eprintln!("❌ --workers must be between 1 and 64, got {workers}");
            return Ok(2);
        }

        let orchestrator = match load_orchestrator(&config) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("❌ Failed to load reference data: {e}");
                return Ok(3);
            }
        };

        let records = encounters::read_encounters(&self.encounters)
            .with_context(|| format!("Failed to load encounters from {}", self.encounters))?;

        let runner = BatchRunner::new(orchestrator, BatchConfig::new(workers, indicators));
        let batch = runner.run(records).await;
        batch.summary.log_summary();

        match self.output.as_ref().or(config.output.path.as_ref()) {
            Some(path) => {
                output::write_results(path, &batch.results, config.output.pretty)
                    .with_context(|| format!("Failed to write results to {path}"))?;
                eprintln!("✅ Results written to {path}");
            }
            None => {
                println!("{}", output::render_results(&batch.results, config.output.pretty)?);
            }
        }

        print_summary(&batch.summary);
        Ok(0)
    }

    /// CLI indicators if given, otherwise the configured ones
    fn resolve_indicators(&self, config: &PsiConfig) -> Result<Vec<IndicatorId>, String> {
        match &self.indicators {
            Some(raw) => {
                let ids = split_list(raw)
                    .iter()
                    .map(|id| IndicatorId::from_str(id))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::info!(indicators = ?ids, "Overriding indicators from CLI");
                if ids.is_empty() {
                    return Err("--indicators must name at least one indicator".to_string());
                }
                Ok(ids)
            }
            None => config.engine.indicator_ids(),
        }
    }
}

fn load_orchestrator(config: &PsiConfig) -> crate::domain::Result<EvaluationOrchestrator> {
    let codes = reference::load_code_sets(&config.reference.code_sets_path)?;
    let catalog = reference::load_catalog(config.reference.catalog_path.as_deref().map(Path::new))?;
    Ok(EvaluationOrchestrator::with_standard_registry(
        Arc::new(codes),
        Arc::new(catalog),
    ))
}

fn print_summary(summary: &BatchSummary) {
    eprintln!();
    eprintln!("Evaluation Summary:");
    eprintln!("  Encounters: {}", summary.total_encounters);
    eprintln!("  Rows: {}", summary.total_rows);
    for status in EvaluationStatus::ALL {
        eprintln!("  {}: {}", status, summary.count(status));
    }
    eprintln!("  Duration: {} ms", summary.duration.as_millis());
}
