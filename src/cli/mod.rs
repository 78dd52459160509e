//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the PSI engine using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// PSI Engine - Patient Safety Indicator classification
#[derive(Parser, Debug)]
#[command(name = "psi-engine")]
#[command(version, about, long_about = None)]
#[command(author = "PSI Engine Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "psi-engine.toml", env = "PSI_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PSI_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify encounters against the configured indicators
    Evaluate(commands::evaluate::EvaluateArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
