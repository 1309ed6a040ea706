//! Configuration types for the leave ledger engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from `engine.yaml`.

use serde::Deserialize;

use crate::models::WeeklySchedule;

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the server binds to (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Ledger recomputation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Maximum number of ledger rows persisted per write.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Number of fiscal years after the current one that get a ledger row.
    #[serde(default = "default_years_ahead")]
    pub years_ahead: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            years_ahead: default_years_ahead(),
        }
    }
}

fn default_batch_size() -> usize {
    50
}

fn default_years_ahead() -> u32 {
    1
}

/// Values applied when a workspace snapshot leaves them out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsConfig {
    /// Zero-based fiscal year start month.
    #[serde(default)]
    pub fiscal_year_start_month: u32,
    /// Weekly schedule used for workspaces without one.
    #[serde(default)]
    pub schedule: WeeklySchedule,
}

/// Complete engine configuration.
///
/// This is the top-level structure of `engine.yaml`. Every section is
/// optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Ledger recomputation settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Workspace defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}
