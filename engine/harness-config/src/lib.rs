//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic shared by
//! the search runner and any process entry point that drives it.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`FLE_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! FLE_<SECTION>_<KEY>=value
//!
//! Examples:
//!     FLE_COMMON_LOG_LEVEL=debug
//!     FLE_SEARCH_MAX_ITERATIONS=500
//!     FLE_SEARCH_NUM_WORKERS=8
//!     FLE_STORAGE_DB_PATH=/data/programs.db
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;

#[cfg(test)]
mod tests;
