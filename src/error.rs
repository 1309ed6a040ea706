//! Error types for the leave ledger engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine can report. The calculation path itself is
//! value based; errors come from invalid input, configuration, and the
//! ledger store.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for the leave ledger engine.
///
/// # Example
///
/// ```
/// use leave_ledger::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The workspace does not exist in the ledger store.
    #[error("Workspace not found: {workspace_id}")]
    WorkspaceNotFound {
        /// The missing workspace.
        workspace_id: Uuid,
    },

    /// The member does not exist in the given workspace.
    #[error("Member '{member_id}' not found in workspace '{workspace_id}'")]
    MemberNotFound {
        /// The workspace that was searched.
        workspace_id: Uuid,
        /// The missing member.
        member_id: Uuid,
    },

    /// A request references a leave type the workspace does not define.
    #[error("Leave type not found: {leave_type_id}")]
    LeaveTypeNotFound {
        /// The missing leave type.
        leave_type_id: Uuid,
    },

    /// A leave request was invalid or contained inconsistent data.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// A description of what made the request invalid.
        message: String,
    },

    /// A workspace record was invalid.
    #[error("Invalid workspace field '{field}': {message}")]
    InvalidWorkspace {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The ledger store failed to read or write.
    #[error("Ledger store error: {message}")]
    Store {
        /// A description of the store failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
