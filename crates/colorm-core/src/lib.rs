//! colorm core - schema catalog, type conversion, validation and advisory
//! uniqueness for a column store.
//!
//! This crate turns a declared table into create/read/update/delete/count
//! operations over any [`Executor`](colorm_proto::Executor).

pub mod catalog;
pub mod constraint;
pub mod convert;
pub mod error;
pub mod model;
pub mod query;
pub mod record;

pub use catalog::{
    ddl_type_name, DefaultValue, FieldDecl, FieldSpec, RuleOutcome, RuleSet, ScalarType, Schema,
    SchemaBuilder, SchemaDef, TypeTag,
};
pub use constraint::{UniqueEnforcer, Validator};
pub use convert::TypeRegistry;
pub use error::Error;
pub use model::Model;
pub use query::{FindOptions, Statement};
pub use record::Record;

/// Re-export protocol types.
pub use colorm_proto as proto;
