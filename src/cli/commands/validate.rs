//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the engine configuration file.

use crate::config::load_config;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates every section before returning
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let indicators = match config.engine.indicator_ids() {
            Ok(ids) => ids,
            Err(e) => {
                println!("❌ {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Code Sets: {}", config.reference.code_sets_path);
        if !Path::new(&config.reference.code_sets_path).exists() {
            println!("  ⚠️  Code set file does not exist yet");
        }
        println!(
            "  Indicator Catalog: {}",
            config.reference.catalog_path.as_deref().unwrap_or("(embedded standard catalog)")
        );
        println!("  Workers: {}", config.engine.workers);
        println!(
            "  Indicators: {}",
            indicators.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
        );
        println!(
            "  Output: {}",
            config.output.path.as_deref().unwrap_or("(stdout)")
        );
        println!("  File Logging: {}", config.logging.local_enabled);
        println!();
        Ok(0)
    }
}
