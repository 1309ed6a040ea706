//! Logging initialization.
//!
//! The engine logs through `tracing`; these helpers install a
//! `tracing-subscriber` formatter filtered by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// `RUST_LOG` selects the filter (e.g. `RUST_LOG=leave_ledger=debug`);
/// without it everything at `info` and above is logged.
///
/// ```no_run
/// leave_ledger::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Installs a debug-level subscriber writing to the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
