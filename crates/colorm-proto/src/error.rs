//! Execution collaborator errors.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while a store executes a statement.
///
/// The record mapper never interprets these; they are surfaced to the caller
/// unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The store rejected the statement (syntax, unknown column, a filter
    /// that needs `ALLOW FILTERING`, ...).
    #[error("invalid statement: {0}")]
    Invalid(String),

    /// No replica or node could serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The statement did not complete in time.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The response could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),
}
