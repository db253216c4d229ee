//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the FLE_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("FLE_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from FLE_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!("FLE_CONFIG={} not found, searching defaults", path.display());
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// A missing or malformed file falls back to the built-in defaults.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, usize, f64, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.parse()) {
            Ok(Ok(v)) => $config.$section.$field = v,
            Ok(Err(_)) => warn!("Ignoring unparseable value for {}", $key),
            Err(_) => {}
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: FLE_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "FLE_COMMON_LOG_LEVEL");

    // Search
    env_override!(config, search.version, "FLE_SEARCH_VERSION", parse);
    env_override!(
        config,
        search.version_description,
        "FLE_SEARCH_VERSION_DESCRIPTION"
    );
    env_override!(
        config,
        search.max_iterations,
        "FLE_SEARCH_MAX_ITERATIONS",
        parse
    );
    env_override!(
        config,
        search.exploration_weight,
        "FLE_SEARCH_EXPLORATION_WEIGHT",
        parse
    );
    env_override!(config, search.batch_size, "FLE_SEARCH_BATCH_SIZE", parse);
    env_override!(config, search.max_depth, "FLE_SEARCH_MAX_DEPTH", parse);
    env_override!(config, search.num_workers, "FLE_SEARCH_NUM_WORKERS", parse);
    env_override!(
        config,
        search.report_interval,
        "FLE_SEARCH_REPORT_INTERVAL",
        parse
    );

    // Storage
    env_override!(config, storage.db_path, "FLE_STORAGE_DB_PATH");

    config
}
