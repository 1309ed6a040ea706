//! Application state for the leave ledger engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::ledger::{AllowanceLedgerUpdater, InMemoryLedgerStore};

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// loaded configuration, the ledger store, and the updater that serializes
/// recomputations per member.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    store: Arc<InMemoryLedgerStore>,
    updater: Arc<AllowanceLedgerUpdater>,
}

impl AppState {
    /// Creates a new application state with an empty in-memory store.
    pub fn new(config: ConfigLoader) -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let updater = AllowanceLedgerUpdater::new(store.clone(), config.ledger());
        Self {
            config: Arc::new(config),
            store,
            updater: Arc::new(updater),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the ledger store.
    pub fn store(&self) -> &InMemoryLedgerStore {
        &self.store
    }

    /// Returns the ledger updater.
    ///
    /// The handle is shared so recomputations can move to a blocking task.
    pub fn updater(&self) -> &Arc<AllowanceLedgerUpdater> {
        &self.updater
    }
}
