//! HTTP API module for the leave ledger engine.
//!
//! This module provides the REST API endpoints for previewing request
//! durations, loading workspace snapshots, and recomputing or reading a
//! member's allowance ledger.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{DurationRequest, LedgerQuery, SnapshotRequest, WorkspaceRequest};
pub use response::{ApiError, ApiErrorResponse, LedgerResponse, SnapshotResponse};
pub use state::AppState;
