//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "psi-engine.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing PSI engine configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Point reference.code_sets_path at your code set JSON");
                println!("  2. Validate configuration: psi-engine validate-config");
                println!("  3. Run: psi-engine evaluate --encounters encounters.json");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# PSI Engine Configuration File

[application]
log_level = "info"

[reference]
code_sets_path = "data/code_sets.json"

[engine]
workers = 4
indicators = []

[output]
pretty = true
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# PSI Engine Configuration File
#
# Values may reference environment variables with ${VAR_NAME}. Any key can
# also be overridden with PSI_<SECTION>_<KEY>, e.g. PSI_ENGINE_WORKERS=8.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
log_level = "info"

# ============================================================================
# Reference Data
# ============================================================================
[reference]
# JSON object mapping code set name to a list of codes (required)
code_sets_path = "data/code_sets.json"

# Indicator catalog JSON. Leave unset to use the embedded standard catalog.
# catalog_path = "${PSI_DATA_DIR}/indicator_catalog.json"

# ============================================================================
# Engine
# ============================================================================
[engine]
# Number of workers evaluating encounters in parallel (1-64)
workers = 4

# Indicators to evaluate. Empty means PSI_02 through PSI_19.
# indicators = ["PSI_03", "PSI_04", "PSI_13"]
indicators = []

# ============================================================================
# Output
# ============================================================================
[output]
# Results file. Results are written to stdout when unset.
# path = "results/psi_results.json"

# Pretty-print the JSON results
pretty = true

# ============================================================================
# Logging
# ============================================================================
[logging]
# Write JSON log files in addition to console output
local_enabled = false

# Log directory
local_path = "./logs"

# Rotation strategy (daily, hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}
