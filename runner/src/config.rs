//! Configuration for a search run
//!
//! Built from the central config (config.toml plus `FLE_*` environment
//! overrides); callers may adjust fields before validating.

use anyhow::{anyhow, Result};
use harness_config::{load_config, CentralConfig};
use mcts::MctsConfig;
use tracing::level_filters::LevelFilter;

use crate::storage::StorageConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Stamped on every program this run persists
    pub version: u32,
    pub version_description: String,
    pub mcts: MctsConfig,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub storage: StorageConfig,
}

impl RunnerConfig {
    /// Load the central config and convert it.
    pub fn load() -> Result<Self> {
        let config = Self::from_central(&load_config());
        config.validate()?;
        Ok(config)
    }

    pub fn from_central(central: &CentralConfig) -> Self {
        let search = &central.search;
        Self {
            version: search.version,
            version_description: search.version_description.clone(),
            mcts: MctsConfig {
                max_iterations: search.max_iterations,
                exploration_weight: search.exploration_weight,
                batch_size: search.batch_size,
                num_workers: search.num_workers,
                max_depth: search.max_depth,
                report_interval: search.report_interval,
            },
            log_level: central.common.log_level.clone(),
            storage: StorageConfig::sqlite(central.storage.db_path.clone()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.mcts.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be greater than 0"));
        }

        if self.mcts.batch_size == 0 {
            return Err(anyhow!("batch_size must be greater than 0"));
        }

        if self.mcts.num_workers == 0 {
            return Err(anyhow!("num_workers must be greater than 0"));
        }

        if !self.mcts.exploration_weight.is_finite() || self.mcts.exploration_weight < 0.0 {
            return Err(anyhow!(
                "exploration_weight must be a finite non-negative number, got {}",
                self.mcts.exploration_weight
            ));
        }

        if self.mcts.report_interval == 0 {
            return Err(anyhow!("report_interval must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RunnerConfig {
        RunnerConfig {
            version: 3,
            version_description: "mcts-test".into(),
            mcts: MctsConfig::for_testing(),
            log_level: "info".into(),
            storage: StorageConfig::Memory,
        }
    }

    #[test]
    fn test_from_central_defaults() {
        let config = RunnerConfig::from_central(&CentralConfig::default());
        assert_eq!(config.version, 1);
        assert_eq!(config.version_description, "mcts");
        assert_eq!(config.mcts, MctsConfig::default());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.storage, StorageConfig::sqlite("./data/programs.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_central_copies_search_section() {
        let mut central = CentralConfig::default();
        central.search.max_iterations = 7;
        central.search.batch_size = 8;
        central.search.num_workers = 2;
        central.search.version = 5;

        let config = RunnerConfig::from_central(&central);
        assert_eq!(config.mcts.max_iterations, 7);
        assert_eq!(config.mcts.selections_per_iteration(), 2);
        assert_eq!(config.version, 5);
    }

    #[test]
    fn test_validate_accepts_base() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut config = base_config();
        config.mcts.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_batch_and_workers() {
        let mut config = base_config();
        config.mcts.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.mcts.num_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_exploration_weight() {
        for weight in [-0.5, f64::NAN, f64::INFINITY] {
            let mut config = base_config();
            config.mcts.exploration_weight = weight;
            assert!(config.validate().is_err(), "accepted {}", weight);
        }

        let mut config = base_config();
        config.mcts.exploration_weight = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_report_interval() {
        let mut config = base_config();
        config.mcts.report_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = base_config();
        config.log_level = "verbose".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }
}
