//! Client error types.

use std::ops::Range;

use colorm_proto::ExecutionError;
use thiserror::Error;

/// Error while tokenizing or parsing statement text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at offset {}", span.start)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Byte range of the offending input.
    pub span: Range<usize>,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Client errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Statement text could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The store failed to execute a statement.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<Error> for ExecutionError {
    fn from(err: Error) -> Self {
        match err {
            Error::Execution(e) => e,
            Error::Parse(e) => ExecutionError::Invalid(e.to_string()),
            Error::Config(msg) => ExecutionError::Unavailable(msg),
        }
    }
}
