//! colorm protocol types.
//!
//! This crate defines the types that cross the boundary between the record
//! mapper and the column store it drives.
//!
//! # Modules
//!
//! - [`value`] - Dynamic values, used both for application input and for
//!   store-native parameters
//! - [`result`] - Rows and result sets returned by the store
//! - [`executor`] - The single `execute(statement, params)` capability
//! - [`error`] - Errors raised by execution collaborators

pub mod error;
pub mod executor;
pub mod result;
pub mod value;

pub use error::ExecutionError;
pub use executor::Executor;
pub use result::{ResultSet, Row};
pub use value::Value;
