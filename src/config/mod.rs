//! Configuration loading and management for the leave ledger engine.
//!
//! This module loads the engine configuration from `engine.yaml`: server
//! settings, ledger recomputation settings and workspace defaults.
//!
//! # Example
//!
//! ```no_run
//! use leave_ledger::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("Listening on {}", config.server().bind_address);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DefaultsConfig, EngineConfig, LedgerConfig, ServerConfig};
