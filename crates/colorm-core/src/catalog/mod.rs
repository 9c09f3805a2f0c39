//! Table catalog for colorm.
//!
//! The catalog holds the immutable description of each table: typed fields,
//! validation rules, defaults, keys, indexes and uniqueness declarations.

pub mod ddl;
mod field;
mod rules;
mod schema;
mod types;

pub use field::{DefaultValue, DetailedFieldDecl, FieldDecl, FieldSpec};
pub use rules::{CustomRule, RuleDecl, RuleOutcome, RuleSet};
pub use schema::{Schema, SchemaBuilder, SchemaDef};
pub use types::{ddl_type_name, ScalarType, TypeTag};
