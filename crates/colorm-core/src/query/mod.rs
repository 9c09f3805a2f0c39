//! Statement construction.
//!
//! Every statement is an equality conjunction over a flat `where` map with
//! positional `?` parameters; values are never inlined into the text.

mod statement;

pub use statement::{count, delete, insert, select, update, FindOptions, Statement};
