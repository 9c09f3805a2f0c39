//! Core error types.

use colorm_proto::ExecutionError;
use thiserror::Error;

/// Core record mapper errors.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more validation rules failed. Every violation is listed.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A declared-unique field collides with a different existing row.
    #[error("{field} '{value}' already exists")]
    UniqueViolation {
        /// Table the collision was found in.
        table: String,
        /// Unique field name.
        field: String,
        /// Offending value, as supplied by the caller.
        value: String,
    },

    /// The execution collaborator failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Invalid schema declaration.
    #[error("schema error: {0}")]
    Schema(String),

    /// Unrecognized type tag.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Write input names a field the schema does not declare.
    #[error("unknown field '{field}' for table {table}")]
    UnknownField {
        /// Table name.
        table: String,
        /// Undeclared field name.
        field: String,
    },

    /// A value could not be coerced to its declared type.
    #[error("cannot convert {field} to {type_name}: {reason}")]
    Conversion {
        /// Field name (empty for bare conversions).
        field: String,
        /// Declared type tag.
        type_name: String,
        /// What went wrong.
        reason: String,
    },

    /// Update or delete without a predicate.
    #[error("{0} requires a non-empty where clause")]
    MissingWhere(&'static str),

    /// The store returned a result the core could not interpret.
    #[error("invalid result: {0}")]
    InvalidResult(String),
}

impl Error {
    /// Attach a field name to a conversion error raised without one.
    pub(crate) fn for_field(self, name: &str) -> Self {
        match self {
            Error::Conversion {
                field,
                type_name,
                reason,
            } if field.is_empty() => Error::Conversion {
                field: name.to_string(),
                type_name,
                reason,
            },
            other => other,
        }
    }

    /// Validation messages, if this is a validation failure.
    pub fn violations(&self) -> Option<&[String]> {
        match self {
            Error::Validation(violations) => Some(violations),
            _ => None,
        }
    }

    /// Check if this is a uniqueness violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::UniqueViolation { .. })
    }
}
