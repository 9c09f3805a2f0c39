//! Advisory uniqueness enforcement.
//!
//! The store has no unique index, so each declared-unique field is checked
//! with an equality lookup before the write is issued.

use colorm_proto::{ExecutionError, Executor, ResultSet, Row, Value};
use tracing::debug;

use crate::catalog::Schema;
use crate::convert::TypeRegistry;
use crate::error::Error;
use crate::query::{self, FindOptions};
use crate::record::Record;

/// Check-then-write uniqueness over an [`Executor`].
///
/// Uniqueness is advisory, not linearizable: each field is a separate read
/// that completes before the caller's write. Two concurrent writers with the
/// same value can both pass the check and both be stored.
pub struct UniqueEnforcer<'a> {
    schema: &'a Schema,
    registry: &'a TypeRegistry,
    executor: &'a dyn Executor,
}

impl<'a> UniqueEnforcer<'a> {
    /// Create an enforcer for `schema`.
    pub fn new(schema: &'a Schema, registry: &'a TypeRegistry, executor: &'a dyn Executor) -> Self {
        Self {
            schema,
            registry,
            executor,
        }
    }

    /// Fail if any unique field present in `record` already holds the same
    /// value in a row whose primary key differs from `exclude`.
    pub async fn assert_unique(&self, record: &Record, exclude: Option<&[Value]>) -> Result<(), Error> {
        for name in self.schema.unique_fields() {
            let Some(raw) = record.get(name) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            let Some(field) = self.schema.get_field(name) else {
                continue;
            };

            let value = self
                .registry
                .convert(raw.clone(), &field.field_type)
                .map_err(|e| e.for_field(name))?;

            let Some(row) = self.lookup(name, value).await? else {
                continue;
            };

            let same_row = exclude.is_some_and(|key| row_key(self.schema, &row) == key);
            if !same_row {
                return Err(Error::UniqueViolation {
                    table: self.schema.table().to_string(),
                    field: name.clone(),
                    value: raw.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Find one row with `field = value`, falling back to a filtering scan
    /// when the field has no index.
    async fn lookup(&self, field: &str, value: Value) -> Result<Option<Row>, Error> {
        let mut filter = Record::new();
        filter.insert(field.to_string(), value);

        let options = FindOptions::new().limit(1);
        if self.schema.is_indexed(field) {
            match self.run(&filter, options).await {
                Err(ExecutionError::Invalid(reason)) => {
                    debug!(
                        table = self.schema.table(),
                        field,
                        reason = %reason,
                        "Indexed lookup rejected, retrying with filtering"
                    );
                }
                result => return Ok(result?.into_rows().into_iter().next()),
            }
        } else {
            debug!(
                table = self.schema.table(),
                field, "No index for unique field, using filtering lookup"
            );
        }

        let result = self.run(&filter, options.allow_filtering()).await?;
        Ok(result.into_rows().into_iter().next())
    }

    async fn run(&self, filter: &Record, options: FindOptions) -> Result<ResultSet, ExecutionError> {
        let stmt = query::select(self.schema, filter, &options);
        debug!(
            table = self.schema.table(),
            statement = %stmt.text,
            params = ?stmt.params,
            "Uniqueness lookup"
        );
        self.executor.execute(&stmt.text, &stmt.params).await
    }
}

/// The full primary key (partition plus clustering columns) of `row`.
pub fn row_key(schema: &Schema, row: &Row) -> Vec<Value> {
    schema
        .primary_key()
        .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::record;

    /// Answers lookups from a fixed row set and records every statement.
    struct FakeStore {
        rows: Vec<Row>,
        reject_plain: bool,
        log: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                rows,
                reject_plain: false,
                log: Mutex::new(Vec::new()),
            }
        }

        fn statements(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Executor for FakeStore {
        async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, ExecutionError> {
            self.log.lock().unwrap().push(statement.to_string());
            if self.reject_plain && !statement.ends_with("ALLOW FILTERING") {
                return Err(ExecutionError::Invalid("needs filtering".into()));
            }
            let column = statement
                .split(" WHERE ")
                .nth(1)
                .and_then(|rest| rest.split(' ').next())
                .unwrap_or_default();
            let rows = self
                .rows
                .iter()
                .filter(|row| row.get(column) == params.first())
                .cloned()
                .collect();
            Ok(ResultSet::new(rows))
        }
    }

    fn users() -> Schema {
        Schema::builder("users")
            .field("id", "int")
            .field("email", "text")
            .field("handle", "text")
            .field("age", "int")
            .key(["id"])
            .indexes(["email"])
            .unique(["email", "handle"])
            .build()
            .unwrap()
    }

    fn existing() -> Row {
        Row::new()
            .with("id", 1i32)
            .with("email", "a@b.com")
            .with("handle", "ann")
    }

    #[tokio::test]
    async fn test_collision_with_other_row() {
        let schema = users();
        let registry = TypeRegistry::new();
        let store = FakeStore::new(vec![existing()]);
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);

        let result = enforcer.assert_unique(&record! { "email" => "a@b.com" }, None).await;
        let err = result.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(err.to_string(), "email 'a@b.com' already exists");

        let excluded = [Value::Int(2)];
        let result = enforcer
            .assert_unique(&record! { "handle" => "ann" }, Some(&excluded[..]))
            .await;
        assert!(matches!(result, Err(Error::UniqueViolation { field, .. }) if field == "handle"));
    }

    #[tokio::test]
    async fn test_own_row_is_excluded() {
        let schema = users();
        let registry = TypeRegistry::new();
        let store = FakeStore::new(vec![existing()]);
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);

        let own = row_key(&schema, &existing());
        assert_eq!(own, vec![Value::Int(1)]);
        enforcer
            .assert_unique(&record! { "email" => "a@b.com", "handle" => "ann" }, Some(own.as_slice()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_only_present_unique_fields_are_checked() {
        let schema = users();
        let registry = TypeRegistry::new();
        let store = FakeStore::new(vec![existing()]);
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);

        enforcer
            .assert_unique(&record! { "age" => 4i32, "handle" => Value::Null }, None)
            .await
            .unwrap();
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_statements() {
        let schema = users();
        let registry = TypeRegistry::new();
        let store = FakeStore::new(vec![]);
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);

        enforcer
            .assert_unique(&record! { "email" => "x@y.z", "handle" => "zed" }, None)
            .await
            .unwrap();
        assert_eq!(
            store.statements(),
            vec![
                "SELECT * FROM users WHERE email = ? LIMIT 1",
                "SELECT * FROM users WHERE handle = ? LIMIT 1 ALLOW FILTERING",
            ]
        );
    }

    #[tokio::test]
    async fn test_unindexed_unique_field_uses_one_filtering_lookup() {
        let schema = users();
        let registry = TypeRegistry::new();
        let mut store = FakeStore::new(vec![existing()]);
        store.reject_plain = true;
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);

        let result = enforcer.assert_unique(&record! { "handle" => "ann" }, None).await;
        assert!(matches!(result, Err(Error::UniqueViolation { field, .. }) if field == "handle"));
        assert_eq!(
            store.statements(),
            vec!["SELECT * FROM users WHERE handle = ? LIMIT 1 ALLOW FILTERING"]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_filtering_when_rejected() {
        let schema = Schema::builder("users")
            .field("id", "int")
            .field("nick", "text")
            .key(["id"])
            .build()
            .unwrap();
        let registry = TypeRegistry::new();
        let mut store = FakeStore::new(vec![Row::new().with("id", 1i32).with("nick", "x")]);
        store.reject_plain = true;
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);

        // Not unique: nothing is looked up.
        enforcer.assert_unique(&record! { "nick" => "x" }, None).await.unwrap();
        assert!(store.statements().is_empty());

        let schema = Schema::builder("users")
            .field("id", "int")
            .field("nick", "text")
            .key(["id"])
            .indexes(["nick"])
            .unique(["nick"])
            .build()
            .unwrap();
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);
        let result = enforcer.assert_unique(&record! { "nick" => "x" }, None).await;
        assert!(result.unwrap_err().is_unique_violation());
        assert_eq!(
            store.statements(),
            vec![
                "SELECT * FROM users WHERE nick = ? LIMIT 1",
                "SELECT * FROM users WHERE nick = ? LIMIT 1 ALLOW FILTERING",
            ]
        );
    }

    #[tokio::test]
    async fn test_lookup_value_is_converted() {
        let schema = Schema::builder("accounts")
            .field("id", "int")
            .field("number", "bigint")
            .key(["id"])
            .unique(["number"])
            .build()
            .unwrap();
        let registry = TypeRegistry::new();
        let store = FakeStore::new(vec![Row::new().with("id", 1i32).with("number", 42i64)]);
        let enforcer = UniqueEnforcer::new(&schema, &registry, &store);

        let result = enforcer.assert_unique(&record! { "number" => "42" }, None).await;
        assert!(matches!(result, Err(Error::UniqueViolation { value, .. }) if value == "42"));

        let bad = enforcer.assert_unique(&record! { "number" => "lots" }, None).await;
        assert!(matches!(bad, Err(Error::Conversion { field, .. }) if field == "number"));
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        struct Down;

        #[async_trait]
        impl Executor for Down {
            async fn execute(&self, _: &str, _: &[Value]) -> Result<ResultSet, ExecutionError> {
                Err(ExecutionError::Unavailable("no hosts".into()))
            }
        }

        let schema = users();
        let registry = TypeRegistry::new();
        let enforcer = UniqueEnforcer::new(&schema, &registry, &Down);
        let result = enforcer.assert_unique(&record! { "email" => "a@b.com" }, None).await;
        assert!(matches!(
            result,
            Err(Error::Execution(ExecutionError::Unavailable(_)))
        ));
    }
}
