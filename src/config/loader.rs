//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::validate_fiscal_year_start_month;

use super::types::{DefaultsConfig, EngineConfig, LedgerConfig, ServerConfig};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// └── engine.yaml   # Server, ledger and workspace defaults
/// ```
///
/// # Example
///
/// ```no_run
/// use leave_ledger::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config").unwrap();
/// println!("Batch size: {}", loader.ledger().batch_size);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `engine.yaml` is missing
    /// - `engine.yaml` contains invalid YAML
    /// - `ledger.batch_size` is zero or the default fiscal start month is out of range
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let engine_path = path.as_ref().join("engine.yaml");
        let config = Self::load_yaml::<EngineConfig>(&engine_path)?;
        Self::validate(&config, &engine_path)?;
        Ok(Self { config })
    }

    /// Wraps an already built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate(config: &EngineConfig, path: &Path) -> EngineResult<()> {
        let parse_error = |message: String| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message,
        };

        if config.ledger.batch_size == 0 {
            return Err(parse_error("ledger.batch_size must be at least 1".to_string()));
        }
        validate_fiscal_year_start_month(config.defaults.fiscal_year_start_month)
            .map_err(|e| parse_error(e.to_string()))
    }

    /// Returns the full configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the server settings.
    pub fn server(&self) -> &ServerConfig {
        &self.config.server
    }

    /// Returns the ledger settings.
    pub fn ledger(&self) -> LedgerConfig {
        self.config.ledger
    }

    /// Returns the workspace defaults.
    pub fn defaults(&self) -> &DefaultsConfig {
        &self.config.defaults
    }
}
