//! Configuration loading, validation and precedence tests

use pledge_config::{ConfigError, ConfigLoader, RuntimeConfig, CONFIG_FILE_NAME};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> std::path::PathBuf {
    let config_path = dir.join(CONFIG_FILE_NAME);
    fs::write(&config_path, content).unwrap();
    config_path
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_when_no_config_exists() {
    let temp_dir = TempDir::new().unwrap();

    let config = ConfigLoader::new()
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(!config.has_config_file());
    assert_eq!(config.runtime, RuntimeConfig::default());
}

#[test]
#[serial]
fn test_load_from_nested_subdirectory_finds_parent() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[scheduler]
queue_capacity = 128
"#,
    );

    let sub2 = temp_dir.path().join("sub1").join("sub2");
    fs::create_dir_all(&sub2).unwrap();

    let config = ConfigLoader::new().load_from_directory(&sub2).unwrap();

    assert_eq!(config.runtime.queue_capacity(), 128);
    assert_eq!(config.config_root(), Some(temp_dir.path()));
}

#[test]
#[serial]
fn test_load_from_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[resolution]\nmax_chain_depth = 3\n");

    let config = ConfigLoader::new().load_from_file(&path).unwrap();

    assert_eq!(config.runtime.max_chain_depth(), Some(3));
    assert_eq!(config.config_root(), Some(temp_dir.path()));
}

#[test]
fn test_load_missing_file_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let result = RuntimeConfig::load_from_file(&temp_dir.path().join("absent.toml"));

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_invalid_toml_reports_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[scheduler\nturn_budget = 1\n");

    match RuntimeConfig::load_from_file(&path) {
        Err(ConfigError::TomlParseError { file, .. }) => assert_eq!(file, path),
        other => panic!("Expected TomlParseError, got {:?}", other),
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

#[rstest]
#[case("[scheduler]\nturn_budget = 0\n", "scheduler.turn_budget")]
#[case("[scheduler]\nqueue_capacity = 2000000\n", "scheduler.queue_capacity")]
#[case("[resolution]\nmax_chain_depth = 0\n", "resolution.max_chain_depth")]
fn test_invalid_values_rejected(#[case] source: &str, #[case] expected_field: &str) {
    match RuntimeConfig::from_toml_str(source) {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected_field),
        other => panic!("Expected InvalidValue for {}, got {:?}", expected_field, other),
    }
}

#[rstest]
#[case("")]
#[case("[scheduler]\n")]
#[case("[resolution]\nmax_chain_depth = 1\n")]
#[case("[scheduler]\nturn_budget = 1\nqueue_capacity = 0\n")]
fn test_valid_configs_accepted(#[case] source: &str) {
    assert!(RuntimeConfig::from_toml_str(source).is_ok());
}

// ============================================================================
// Environment Override Tests
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_take_precedence() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[scheduler]
turn_budget = 10
queue_capacity = 16

[resolution]
max_chain_depth = 5
"#,
    );

    env::set_var("PLEDGE_QUEUE_CAPACITY", "32");
    env::set_var("PLEDGE_MAX_CHAIN_DEPTH", " 50 ");
    let result = ConfigLoader::new().load_from_directory(temp_dir.path());
    env::remove_var("PLEDGE_QUEUE_CAPACITY");
    env::remove_var("PLEDGE_MAX_CHAIN_DEPTH");

    let config = result.unwrap();
    assert_eq!(config.runtime.turn_budget(), Some(10));
    assert_eq!(config.runtime.queue_capacity(), 32);
    assert_eq!(config.runtime.max_chain_depth(), Some(50));
}

#[test]
#[serial]
fn test_env_override_still_validated() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("PLEDGE_TURN_BUDGET", "0");
    let result = ConfigLoader::new().load_from_directory(temp_dir.path());
    env::remove_var("PLEDGE_TURN_BUDGET");

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial]
fn test_custom_env_prefix() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("MYAPP_TURN_BUDGET", "77");
    let result = ConfigLoader::with_env_prefix("MYAPP").load_from_directory(temp_dir.path());
    env::remove_var("MYAPP_TURN_BUDGET");

    assert_eq!(result.unwrap().runtime.turn_budget(), Some(77));
}
