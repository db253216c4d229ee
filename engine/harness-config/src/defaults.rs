//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so every binary that links
//! this crate agrees on the same built-in values.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    search: SearchDefaults,
    storage: StorageDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct SearchDefaults {
    version: u32,
    version_description: String,
    max_iterations: u32,
    exploration_weight: f64,
    batch_size: usize,
    max_depth: u32,
    num_workers: usize,
    report_interval: u32,
}

#[derive(Debug, Deserialize)]
struct StorageDefaults {
    db_path: String,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Search
pub fn version() -> u32 {
    DEFAULTS.search.version
}
pub fn version_description() -> &'static str {
    &DEFAULTS.search.version_description
}
pub fn max_iterations() -> u32 {
    DEFAULTS.search.max_iterations
}
pub fn exploration_weight() -> f64 {
    DEFAULTS.search.exploration_weight
}
pub fn batch_size() -> usize {
    DEFAULTS.search.batch_size
}
pub fn max_depth() -> u32 {
    DEFAULTS.search.max_depth
}
pub fn num_workers() -> usize {
    DEFAULTS.search.num_workers
}
pub fn report_interval() -> u32 {
    DEFAULTS.search.report_interval
}

// Storage
pub fn db_path() -> &'static str {
    &DEFAULTS.storage.db_path
}
