//! colorm - a schema-driven record mapper for wide-column stores.
//!
//! Declare a table once, then create, find, update, delete and count
//! records through a [`Model`]. Writes are validated against declared rules,
//! checked for advisory uniqueness and converted to the store's native types
//! before any statement is issued.
//!
//! ```ignore
//! use std::sync::Arc;
//! use colorm::{record, Mapper, MemoryStore, Schema};
//!
//! let schema = Schema::from_json("users", serde_json::json!({
//!     "fields": {
//!         "id": "uuid",
//!         "email": {"type": "text", "unique": true, "validate": {"required": true, "isEmail": true}}
//!     },
//!     "key": ["id"]
//! }))?;
//!
//! let mapper = Mapper::new(Arc::new(MemoryStore::new()));
//! let users = mapper.model(schema);
//! let user = users.create(record! { "email" => "a@b.com" }).await?;
//! ```

use std::sync::Arc;

use tracing::debug;

pub use colorm_core::{
    catalog, constraint, convert, ddl_type_name, query, record, DefaultValue, Error, FieldDecl,
    FieldSpec, FindOptions, Model, Record, RuleOutcome, RuleSet, ScalarType, Schema,
    SchemaBuilder, SchemaDef, Statement, TypeRegistry, TypeTag,
};
pub use colorm_proto::{ExecutionError, Executor, ResultSet, Row, Value};

#[cfg(feature = "client")]
pub use colorm_client::{ClientConfig, MemoryStore, Session};

/// Re-export protocol types.
pub use colorm_proto as proto;

/// Shares one executor and one type registry across every model.
#[derive(Clone)]
pub struct Mapper {
    executor: Arc<dyn Executor>,
    registry: TypeRegistry,
}

impl Mapper {
    /// Create a mapper over `executor`.
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            registry: TypeRegistry::new(),
        }
    }

    /// Use a specific type registry for every model.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the model for `schema`.
    pub fn model(&self, schema: Schema) -> Model {
        debug!(table = %schema.qualified_name(), "Registering model");
        Model::new(schema, self.executor.clone()).with_registry(self.registry.clone())
    }

    /// The shared executor.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }
}
