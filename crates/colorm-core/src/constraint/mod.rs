//! Constraint enforcement module.
//!
//! This module checks write input before anything reaches the store:
//! - Declarative field rules (required, lengths, bounds, formats, custom)
//! - Advisory uniqueness for declared-unique fields

mod unique;
mod validator;

pub use unique::{row_key, UniqueEnforcer};
pub use validator::Validator;
