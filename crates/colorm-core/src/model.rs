//! Per-table record operations.
//!
//! A [`Model`] sequences validation, uniqueness, conversion and statement
//! execution for one table. Each call is a single pass; the model holds no
//! state besides the shared, read-only schema.

use std::sync::Arc;

use colorm_proto::{Executor, ResultSet, Row};
use tracing::debug;

use crate::catalog::Schema;
use crate::constraint::{row_key, UniqueEnforcer, Validator};
use crate::convert::TypeRegistry;
use crate::error::Error;
use crate::query::{self, FindOptions, Statement};
use crate::record::Record;

/// Create/read/update/delete/count facade for one table.
#[derive(Clone)]
pub struct Model {
    schema: Arc<Schema>,
    registry: Arc<TypeRegistry>,
    executor: Arc<dyn Executor>,
}

impl Model {
    /// Create a model over `executor` with a default type registry.
    pub fn new(schema: Schema, executor: Arc<dyn Executor>) -> Self {
        Self {
            schema: Arc::new(schema),
            registry: Arc::new(TypeRegistry::new()),
            executor,
        }
    }

    /// Use a specific type registry.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// The table schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The type registry used for conversion.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Pre-flight validation without a write.
    pub fn validate(&self, data: &Record, is_update: bool) -> Vec<String> {
        Validator::new(&self.schema).validate(data, is_update)
    }

    /// Validate, check uniqueness, convert and insert `input`.
    ///
    /// Returns the converted record, including generated identifiers and
    /// applied defaults.
    pub async fn create(&self, input: Record) -> Result<Record, Error> {
        let violations = self.validate(&input, false);
        if !violations.is_empty() {
            return Err(Error::Validation(violations));
        }

        self.enforcer().assert_unique(&input, None).await?;

        let converted = self.registry.convert_object(input, &self.schema)?;
        let stmt = query::insert(&self.schema, &converted);
        self.execute(&stmt).await?;

        Ok(converted)
    }

    /// Rows matching every `field = value` pair of `filter` (all rows when
    /// empty), as the store returned them.
    pub async fn find(&self, filter: Record) -> Result<Vec<Row>, Error> {
        self.find_with(filter, FindOptions::new()).await
    }

    /// [`find`](Self::find) with a row limit and/or filtering scan.
    pub async fn find_with(&self, filter: Record, options: FindOptions) -> Result<Vec<Row>, Error> {
        let filter = self.registry.convert_where(filter, &self.schema)?;
        let stmt = query::select(&self.schema, &filter, &options);
        Ok(self.execute(&stmt).await?.into_rows())
    }

    /// The first matching row, or `None`.
    pub async fn find_one(&self, filter: Record) -> Result<Option<Row>, Error> {
        let rows = self.find_with(filter, FindOptions::new().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Apply a partial update to the rows matching `filter`.
    ///
    /// Only fields present in `data` are validated and written; primary key
    /// columns are never part of the SET list.
    pub async fn update(&self, data: Record, filter: Record) -> Result<(), Error> {
        if filter.is_empty() {
            return Err(Error::MissingWhere("update"));
        }

        let violations = self.validate(&data, true);
        if !violations.is_empty() {
            return Err(Error::Validation(violations));
        }

        let filter = self.registry.convert_where(filter, &self.schema)?;

        let touches_unique = self
            .schema
            .unique_fields()
            .iter()
            .any(|name| data.contains_key(name));
        if touches_unique {
            let stmt = query::select(&self.schema, &filter, &FindOptions::new().limit(1));
            let current = self.execute(&stmt).await?.into_rows().into_iter().next();
            if let Some(current) = current {
                let key = row_key(&self.schema, &current);
                self.enforcer().assert_unique(&data, Some(key.as_slice())).await?;
            }
        }

        let mut set = self.registry.convert_present(data, &self.schema)?;
        set.retain(|name, _| !self.schema.is_primary_key(name));

        match query::update(&self.schema, &set, &filter) {
            Some(stmt) => {
                self.execute(&stmt).await?;
            }
            None => debug!(table = self.schema.table(), "Nothing to update"),
        }
        Ok(())
    }

    /// Delete the rows matching `filter`.
    pub async fn delete(&self, filter: Record) -> Result<(), Error> {
        if filter.is_empty() {
            return Err(Error::MissingWhere("delete"));
        }
        let filter = self.registry.convert_where(filter, &self.schema)?;
        let stmt = query::delete(&self.schema, &filter);
        self.execute(&stmt).await?;
        Ok(())
    }

    /// Number of rows matching `filter` (all rows when empty).
    pub async fn count(&self, filter: Record) -> Result<i64, Error> {
        self.count_with(filter, FindOptions::new()).await
    }

    /// [`count`](Self::count) with a filtering scan allowed.
    pub async fn count_with(&self, filter: Record, options: FindOptions) -> Result<i64, Error> {
        let filter = self.registry.convert_where(filter, &self.schema)?;
        let stmt = query::count(&self.schema, &filter, &options);
        let result = self.execute(&stmt).await?;

        result
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|value| value.as_i64())
            .ok_or_else(|| Error::InvalidResult("count result has no count column".to_string()))
    }

    fn enforcer(&self) -> UniqueEnforcer<'_> {
        UniqueEnforcer::new(&self.schema, &self.registry, self.executor.as_ref())
    }

    async fn execute(&self, stmt: &Statement) -> Result<ResultSet, Error> {
        debug!(
            table = self.schema.table(),
            statement = %stmt.text,
            params = ?stmt.params,
            "Executing statement"
        );
        Ok(self.executor.execute(&stmt.text, &stmt.params).await?)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("table", &self.schema.qualified_name())
            .finish_non_exhaustive()
    }
}
