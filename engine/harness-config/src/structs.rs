//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_version() -> u32 {
    defaults::version()
}
fn d_version_description() -> String {
    defaults::version_description().into()
}
fn d_max_iterations() -> u32 {
    defaults::max_iterations()
}
fn d_exploration_weight() -> f64 {
    defaults::exploration_weight()
}
fn d_batch_size() -> usize {
    defaults::batch_size()
}
fn d_max_depth() -> u32 {
    defaults::max_depth()
}
fn d_num_workers() -> usize {
    defaults::num_workers()
}
fn d_report_interval() -> u32 {
    defaults::report_interval()
}
fn d_db_path() -> String {
    defaults::db_path().into()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Settings shared by every component
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
        }
    }
}

/// MCTS run parameters
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Version tag stamped on every program produced by the run
    #[serde(default = "d_version")]
    pub version: u32,
    #[serde(default = "d_version_description")]
    pub version_description: String,
    #[serde(default = "d_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "d_exploration_weight")]
    pub exploration_weight: f64,
    #[serde(default = "d_batch_size")]
    pub batch_size: usize,
    #[serde(default = "d_max_depth")]
    pub max_depth: u32,
    #[serde(default = "d_num_workers")]
    pub num_workers: usize,
    /// Iterations between progress reports
    #[serde(default = "d_report_interval")]
    pub report_interval: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            version: defaults::version(),
            version_description: defaults::version_description().into(),
            max_iterations: defaults::max_iterations(),
            exploration_weight: defaults::exploration_weight(),
            batch_size: defaults::batch_size(),
            max_depth: defaults::max_depth(),
            num_workers: defaults::num_workers(),
            report_interval: defaults::report_interval(),
        }
    }
}

/// Program store settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding persisted programs
    #[serde(default = "d_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path().into(),
        }
    }
}
