//! Integration tests for configuration loading and validation
//!
//! Every test here takes `ENV_MUTEX`: `load_config` reads `PSI_*` overrides
//! from the process environment, which the tests share.

use psi_engine::config::load_config;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

// Mutex to serialize tests that read or modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const OVERRIDE_VARS: [&str; 10] = [
    "PSI_APPLICATION_LOG_LEVEL",
    "PSI_REFERENCE_CODE_SETS_PATH",
    "PSI_REFERENCE_CATALOG_PATH",
    "PSI_ENGINE_WORKERS",
    "PSI_ENGINE_INDICATORS",
    "PSI_OUTPUT_PATH",
    "PSI_OUTPUT_PRETTY",
    "PSI_LOGGING_LOCAL_ENABLED",
    "PSI_LOGGING_LOCAL_PATH",
    "PSI_LOGGING_LOCAL_ROTATION",
];

/// Takes the environment lock and clears every override variable
fn clean_env() -> MutexGuard<'static, ()> {
    let guard = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for var in OVERRIDE_VARS {
        std::env::remove_var(var);
    }
    std::env::remove_var("TEST_PSI_DATA_DIR");
    guard
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = clean_env();
    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[reference]
code_sets_path = "/srv/psi/code_sets.json"
catalog_path = "/srv/psi/catalog.json"

[engine]
workers = 12
indicators = ["PSI_03", "PSI_13", "PSI_15"]

[output]
path = "/srv/psi/results.json"
pretty = false

[logging]
local_enabled = true
local_path = "/var/log/psi"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.reference.code_sets_path, "/srv/psi/code_sets.json");
    assert_eq!(
        config.reference.catalog_path,
        Some("/srv/psi/catalog.json".to_string())
    );
    assert_eq!(config.engine.workers, 12);
    assert_eq!(config.engine.indicator_ids().unwrap().len(), 3);
    assert_eq!(config.output.path, Some("/srv/psi/results.json".to_string()));
    assert!(!config.output.pretty);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "/var/log/psi");
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = clean_env();
    let temp_file = write_config(
        r#"
[reference]
code_sets_path = "codes.json"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.reference.catalog_path, None);
    assert_eq!(config.engine.workers, 4);
    assert_eq!(config.engine.indicator_ids().unwrap().len(), 18);
    assert_eq!(config.output.path, None);
    assert!(config.output.pretty);
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "./logs");
    assert_eq!(config.logging.local_rotation, "daily");
}

#[test]
fn test_env_var_substitution() {
    let _lock = clean_env();
    std::env::set_var("TEST_PSI_DATA_DIR", "/data/psi");

    let temp_file = write_config(
        r#"
# catalog_path = "${UNSET_IN_A_COMMENT}/catalog.json"
[reference]
code_sets_path = "${TEST_PSI_DATA_DIR}/code_sets.json"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");
    assert_eq!(config.reference.code_sets_path, "/data/psi/code_sets.json");

    std::env::remove_var("TEST_PSI_DATA_DIR");
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _lock = clean_env();
    let temp_file = write_config(
        r#"
[reference]
code_sets_path = "${TEST_PSI_DATA_DIR}/code_sets.json"
"#,
    );

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_PSI_DATA_DIR"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = clean_env();
    std::env::set_var("PSI_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("PSI_ENGINE_WORKERS", "16");
    std::env::set_var("PSI_ENGINE_INDICATORS", "PSI_04, PSI_12");
    std::env::set_var("PSI_OUTPUT_PRETTY", "false");

    let temp_file = write_config(
        r#"
[application]
log_level = "info"

[reference]
code_sets_path = "codes.json"

[engine]
workers = 2
indicators = ["PSI_03"]
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.engine.workers, 16);
    assert_eq!(config.engine.indicators, vec!["PSI_04", "PSI_12"]);
    assert!(!config.output.pretty);

    for var in OVERRIDE_VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_non_numeric_worker_override_fails() {
    let _lock = clean_env();
    std::env::set_var("PSI_ENGINE_WORKERS", "many");

    let temp_file = write_config(
        r#"
[reference]
code_sets_path = "codes.json"
"#,
    );

    assert!(load_config(temp_file.path()).is_err());
    std::env::remove_var("PSI_ENGINE_WORKERS");
}

#[test]
fn test_invalid_config_validation() {
    let _lock = clean_env();

    for content in [
        "[application]\nlog_level = \"loud\"\n[reference]\ncode_sets_path = \"codes.json\"\n",
        "[reference]\ncode_sets_path = \"\"\n",
        "[reference]\ncode_sets_path = \"codes.json\"\n[engine]\nworkers = 0\n",
        "[reference]\ncode_sets_path = \"codes.json\"\n[engine]\nindicators = [\"HAC_01\"]\n",
        "[reference]\ncode_sets_path = \"codes.json\"\n[logging]\nlocal_rotation = \"size\"\n",
    ] {
        let temp_file = write_config(content);
        assert!(load_config(temp_file.path()).is_err(), "accepted: {content}");
    }
}

#[test]
fn test_missing_reference_section_fails() {
    let _lock = clean_env();
    let temp_file = write_config("[application]\nlog_level = \"info\"\n");

    assert!(load_config(temp_file.path()).is_err());
}

#[test]
fn test_missing_file_fails() {
    let _lock = clean_env();
    let err = load_config("/nonexistent/psi-engine.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}
