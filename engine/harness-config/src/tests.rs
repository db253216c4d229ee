//! Tests for the configuration module.

use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.storage.db_path, "./data/programs.db");
}

#[test]
fn test_search_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.search.version, 1);
    assert_eq!(config.search.version_description, "mcts");
    assert_eq!(config.search.max_iterations, 100);
    assert!((config.search.exploration_weight - 1.41).abs() < f64::EPSILON);
    assert_eq!(config.search.batch_size, 4);
    assert_eq!(config.search.max_depth, 16);
    assert_eq!(config.search.num_workers, 4);
    assert_eq!(config.search.report_interval, 10);
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
log_level = "debug"

[search]
version = 42
version_description = "wide batches"
max_iterations = 500
exploration_weight = 2.0
batch_size = 16
num_workers = 8

[storage]
db_path = "/tmp/programs.db"
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "debug");
    assert_eq!(config.search.version, 42);
    assert_eq!(config.search.version_description, "wide batches");
    assert_eq!(config.search.max_iterations, 500);
    assert!((config.search.exploration_weight - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.search.batch_size, 16);
    assert_eq!(config.search.num_workers, 8);
    assert_eq!(config.storage.db_path, "/tmp/programs.db");
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[search]
num_workers = 2
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.search.num_workers, 2);
    assert_eq!(config.search.batch_size, 4); // Default
    assert_eq!(config.common.log_level, "info"); // Default
}

#[test]
fn test_env_overrides() {
    std::env::set_var("FLE_SEARCH_VERSION_DESCRIPTION", "from-env");
    std::env::set_var("FLE_SEARCH_MAX_DEPTH", "9");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.search.version_description, "from-env");
    assert_eq!(config.search.max_depth, 9);

    std::env::remove_var("FLE_SEARCH_VERSION_DESCRIPTION");
    std::env::remove_var("FLE_SEARCH_MAX_DEPTH");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    std::env::set_var("FLE_SEARCH_REPORT_INTERVAL", "often");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.search.report_interval, 10);

    std::env::remove_var("FLE_SEARCH_REPORT_INTERVAL");
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[storage]\ndb_path = \"/srv/fle.db\"").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.storage.db_path, "/srv/fle.db");
}

#[test]
fn test_load_from_malformed_path_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search\nbatch_size = ").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.search.batch_size, 4);
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.search.version, cloned.search.version);
    assert_eq!(config.storage.db_path, cloned.storage.db_path);
}

#[test]
fn test_unknown_common_keys_are_ignored() {
    let toml_content = r#"
[common]
data_dir = "/var/lib/fle"
log_level = "warn"
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "warn");
}
