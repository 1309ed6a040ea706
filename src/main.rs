//! Leave ledger engine HTTP server.
//!
//! Loads `engine.yaml` from the directory named by `LEAVE_LEDGER_CONFIG`
//! (default `./config`) and serves the API on the configured address.

use std::error::Error;

use leave_ledger::api::{AppState, create_router};
use leave_ledger::config::ConfigLoader;
use leave_ledger::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let config_dir =
        std::env::var("LEAVE_LEDGER_CONFIG").unwrap_or_else(|_| "./config".to_string());
    let config = ConfigLoader::load(&config_dir)?;
    let bind_address = config.server().bind_address.clone();
    info!(
        config_dir = %config_dir,
        batch_size = config.ledger().batch_size,
        years_ahead = config.ledger().years_ahead,
        "Configuration loaded"
    );

    let router = create_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, version = env!("CARGO_PKG_VERSION"), "Leave ledger engine listening");

    axum::serve(listener, router).await?;
    Ok(())
}
