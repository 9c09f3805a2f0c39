//! In-process store that executes the statement subset emitted by colorm.
//!
//! Tables are created on first use and start empty. A table declared with
//! [`MemoryStore::define_table`] also enforces primary key and index rules:
//! filters on columns that are neither key columns nor indexed need
//! `ALLOW FILTERING`, and writes must name the full primary key.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use colorm_proto::{ExecutionError, Executor, ResultSet, Row, Value};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::error::Error;
use crate::parser::{self, Command, Projection};

const FILTERING_REQUIRED: &str = "Cannot execute this query as it might involve data filtering \
     and thus may have unpredictable performance. If you want to execute this query despite \
     the performance unpredictability, use ALLOW FILTERING";

/// Declared layout of a table.
#[derive(Debug, Clone, Default)]
struct Layout {
    partition: Vec<String>,
    clustering: Vec<String>,
    indexes: HashSet<String>,
}

impl Layout {
    fn key_columns(&self) -> impl Iterator<Item = &String> {
        self.partition.iter().chain(self.clustering.iter())
    }

    fn is_key(&self, column: &str) -> bool {
        self.key_columns().any(|c| c == column)
    }
}

#[derive(Debug, Default)]
struct Table {
    layout: Option<Layout>,
    rows: Vec<Row>,
}

impl Table {
    /// Reject filters the store could only answer with a scan.
    fn check_filter(&self, filter: &[String], allow_filtering: bool) -> Result<(), ExecutionError> {
        let Some(layout) = &self.layout else {
            return Ok(());
        };
        if filter.is_empty() || allow_filtering {
            return Ok(());
        }

        // Either one secondary index plus key columns, or the whole partition
        // key plus clustering columns.
        let indexed = filter.iter().filter(|c| layout.indexes.contains(*c)).count();
        let served = match indexed {
            0 => {
                layout.partition.iter().all(|c| filter.contains(c))
                    && filter.iter().all(|c| layout.is_key(c))
            }
            1 => filter
                .iter()
                .all(|c| layout.is_key(c) || layout.indexes.contains(c)),
            _ => false,
        };

        if served {
            Ok(())
        } else {
            Err(ExecutionError::Invalid(FILTERING_REQUIRED.to_string()))
        }
    }

    /// Writes address rows by their full primary key.
    fn check_key(&self, columns: &[String]) -> Result<(), ExecutionError> {
        let Some(layout) = &self.layout else {
            return Ok(());
        };
        for key in layout.key_columns() {
            if !columns.contains(key) {
                return Err(ExecutionError::Invalid(format!(
                    "Some primary key parts are missing: {}",
                    key
                )));
            }
        }
        Ok(())
    }

    fn matches(row: &Row, filter: &[(String, Value)]) -> bool {
        filter
            .iter()
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
    }

    fn position_by_key(&self, row: &Row) -> Option<usize> {
        let layout = self.layout.as_ref()?;
        self.rows.iter().position(|existing| {
            layout
                .key_columns()
                .all(|c| existing.get(c).unwrap_or(&Value::Null) == row.get(c).unwrap_or(&Value::Null))
        })
    }
}

/// Default number of parsed statements kept by a [`MemoryStore`].
pub const DEFAULT_STATEMENT_CACHE: usize = 1024;

/// An in-memory [`Executor`] for tests and local development.
///
/// Parsed statements are cached by text, the way a driver caches prepared
/// statements. The cache is dropped whenever it reaches its capacity.
#[derive(Debug)]
pub struct MemoryStore {
    tables: DashMap<String, Table>,
    prepared: DashMap<String, Arc<Command>>,
    cache_capacity: usize,
    keyspace: RwLock<Option<String>>,
    log: Mutex<Vec<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: DashMap::new(),
            prepared: DashMap::new(),
            cache_capacity: DEFAULT_STATEMENT_CACHE,
            keyspace: RwLock::new(None),
            log: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` parsed statements (at least one).
    pub fn with_statement_cache(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Declare a table's key and indexes, turning on key and filtering
    /// checks for it. `table` is matched against the resolved statement
    /// table name (`keyspace.table` once a keyspace is in use).
    pub fn define_table<P, C, I>(&self, table: &str, partition: P, clustering: C, indexes: I)
    where
        P: IntoIterator,
        P::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let layout = Layout {
            partition: partition.into_iter().map(Into::into).collect(),
            clustering: clustering.into_iter().map(Into::into).collect(),
            indexes: indexes.into_iter().map(Into::into).collect(),
        };
        self.tables.entry(table.to_string()).or_default().layout = Some(layout);
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .get(&self.resolve(table))
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Every statement executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Forget the statement log.
    pub fn clear_statements(&self) {
        self.log.lock().clear();
    }

    /// Keyspace selected by the last `USE`.
    pub fn keyspace(&self) -> Option<String> {
        self.keyspace.read().clone()
    }

    fn resolve(&self, table: &str) -> String {
        if table.contains('.') {
            return table.to_string();
        }
        match self.keyspace.read().as_deref() {
            Some(keyspace) => format!("{}.{}", keyspace, table),
            None => table.to_string(),
        }
    }

    fn prepare(&self, statement: &str) -> Result<Arc<Command>, Error> {
        if let Some(command) = self.prepared.get(statement) {
            return Ok(command.clone());
        }
        let command = Arc::new(parser::parse(statement)?);
        if self.prepared.len() >= self.cache_capacity {
            trace!(entries = self.prepared.len(), "Statement cache full, clearing");
            self.prepared.clear();
        }
        self.prepared
            .insert(statement.to_string(), command.clone());
        Ok(command)
    }

    fn run(&self, command: &Command, params: &[Value]) -> Result<ResultSet, Error> {
        if params.len() != command.markers() {
            return Err(ExecutionError::Invalid(format!(
                "expected {} bound values, got {}",
                command.markers(),
                params.len()
            ))
            .into());
        }

        match command {
            Command::Use { keyspace } => {
                *self.keyspace.write() = Some(keyspace.clone());
                Ok(ResultSet::empty())
            }
            Command::Insert { table, columns } => {
                let row: Row = columns.iter().cloned().zip(params.iter().cloned()).collect();
                let mut table = self.tables.entry(self.resolve(table)).or_default();
                table.check_key(columns)?;
                match table.position_by_key(&row) {
                    Some(i) => {
                        for (column, value) in row {
                            table.rows[i].set(column, value);
                        }
                    }
                    None => table.rows.push(row),
                }
                Ok(ResultSet::empty())
            }
            Command::Select {
                table,
                projection,
                filter,
                limit,
                allow_filtering,
            } => {
                let bound = bind(filter, params);
                let table = self.tables.entry(self.resolve(table)).or_default();
                table.check_filter(filter, *allow_filtering)?;

                let matching = table.rows.iter().filter(|row| Table::matches(row, &bound));
                match projection {
                    Projection::Count => {
                        let count = matching.count() as i64;
                        Ok(ResultSet::new(vec![Row::new().with("count", count)]))
                    }
                    Projection::All => {
                        let rows = matching.take(limit.unwrap_or(usize::MAX)).cloned().collect();
                        Ok(ResultSet::new(rows))
                    }
                }
            }
            Command::Update { table, set, filter } => {
                let (set_params, filter_params) = params.split_at(set.len());
                let assignments = bind(set, set_params);
                let bound = bind(filter, filter_params);

                let mut table = self.tables.entry(self.resolve(table)).or_default();
                table.check_key(filter)?;

                let mut updated = 0;
                for row in table.rows.iter_mut().filter(|row| Table::matches(row, &bound)) {
                    for (column, value) in &assignments {
                        row.set(column.clone(), value.clone());
                    }
                    updated += 1;
                }
                if updated == 0 && table.layout.is_some() {
                    let row: Row = bound.into_iter().chain(assignments).collect();
                    table.rows.push(row);
                }
                Ok(ResultSet::empty())
            }
            Command::Delete { table, filter } => {
                let bound = bind(filter, params);
                let mut table = self.tables.entry(self.resolve(table)).or_default();
                table.check_key(filter)?;
                table.rows.retain(|row| !Table::matches(row, &bound));
                Ok(ResultSet::empty())
            }
        }
    }
}

fn bind(columns: &[String], params: &[Value]) -> Vec<(String, Value)> {
    columns.iter().cloned().zip(params.iter().cloned()).collect()
}

#[async_trait]
impl Executor for MemoryStore {
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, ExecutionError> {
        self.log.lock().push(statement.to_string());
        trace!(statement, params = ?params, "Memory store executing");

        let command = self.prepare(statement)?;
        Ok(self.run(&command, params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exec(store: &MemoryStore, statement: &str, params: &[Value]) -> ResultSet {
        store.execute(statement, params).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let store = MemoryStore::new();
        exec(&store, "INSERT INTO users (id, name) VALUES (?, ?)", &[1i32.into(), "Ann".into()]).await;
        exec(&store, "INSERT INTO users (id, name) VALUES (?, ?)", &[2i32.into(), "Bo".into()]).await;

        let all = exec(&store, "SELECT * FROM users", &[]).await;
        assert_eq!(all.len(), 2);

        let one = exec(&store, "SELECT * FROM users WHERE name = ?", &["Bo".into()]).await;
        assert_eq!(one.first().unwrap().get("id"), Some(&Value::Int(2)));

        let limited = exec(&store, "SELECT * FROM users LIMIT 1", &[]).await;
        assert_eq!(limited.len(), 1);

        let count = exec(&store, "SELECT COUNT(*) FROM users", &[]).await;
        assert_eq!(count.first().unwrap().get("count"), Some(&Value::BigInt(2)));
    }

    #[tokio::test]
    async fn test_statement_cache_is_bounded() {
        let store = MemoryStore::new().with_statement_cache(2);
        for table in ["a", "b", "c", "d", "e"] {
            exec(&store, &format!("SELECT * FROM {}", table), &[]).await;
            assert!(store.prepared.len() <= 2);
        }

        // Cached statements still execute.
        exec(&store, "SELECT * FROM e", &[]).await;
        assert!(store.prepared.contains_key("SELECT * FROM e"));
        assert_eq!(store.statements().len(), 6);
    }

    #[tokio::test]
    async fn test_insert_upserts_by_key() {
        let store = MemoryStore::new();
        store.define_table("users", ["id"], Vec::<String>::new(), Vec::<String>::new());

        exec(&store, "INSERT INTO users (id, name) VALUES (?, ?)", &[1i32.into(), "Ann".into()]).await;
        exec(&store, "INSERT INTO users (id, name) VALUES (?, ?)", &[1i32.into(), "Anna".into()]).await;

        let rows = store.rows("users");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::from("Anna")));

        let missing = store
            .execute("INSERT INTO users (name) VALUES (?)", &["x".into()])
            .await;
        assert!(matches!(missing, Err(ExecutionError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_filtering_rules() {
        let store = MemoryStore::new();
        store.define_table("users", ["id"], Vec::<String>::new(), ["email"]);
        exec(
            &store,
            "INSERT INTO users (id, email, name) VALUES (?, ?, ?)",
            &[1i32.into(), "a@b.com".into(), "Ann".into()],
        )
        .await;

        exec(&store, "SELECT * FROM users WHERE id = ?", &[1i32.into()]).await;
        exec(&store, "SELECT * FROM users WHERE email = ?", &["a@b.com".into()]).await;

        let rejected = store
            .execute("SELECT * FROM users WHERE name = ?", &["Ann".into()])
            .await;
        assert!(matches!(rejected, Err(ExecutionError::Invalid(msg)) if msg.contains("ALLOW FILTERING")));

        let filtered = exec(
            &store,
            "SELECT * FROM users WHERE name = ? ALLOW FILTERING",
            &["Ann".into()],
        )
        .await;
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        store.define_table("users", ["id"], Vec::<String>::new(), Vec::<String>::new());
        exec(&store, "INSERT INTO users (id, name) VALUES (?, ?)", &[1i32.into(), "Ann".into()]).await;

        exec(&store, "UPDATE users SET name = ? WHERE id = ?", &["Bo".into(), 1i32.into()]).await;
        assert_eq!(store.rows("users")[0].get("name"), Some(&Value::from("Bo")));

        // Updating an absent key creates the row.
        exec(&store, "UPDATE users SET name = ? WHERE id = ?", &["Cy".into(), 2i32.into()]).await;
        assert_eq!(store.rows("users").len(), 2);

        exec(&store, "DELETE FROM users WHERE id = ?", &[1i32.into()]).await;
        let rows = store.rows("users");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(2)));

        let keyless = store
            .execute("DELETE FROM users WHERE name = ?", &["Cy".into()])
            .await;
        assert!(matches!(keyless, Err(ExecutionError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_use_keyspace_resolves_tables() {
        let store = MemoryStore::new();
        exec(&store, "USE app", &[]).await;
        exec(&store, "INSERT INTO users (id) VALUES (?)", &[1i32.into()]).await;

        assert_eq!(store.keyspace().as_deref(), Some("app"));
        assert_eq!(store.rows("app.users").len(), 1);
        assert_eq!(store.rows("users").len(), 1);
    }

    #[tokio::test]
    async fn test_errors() {
        let store = MemoryStore::new();

        let unknown = store.execute("SELECT * FROM nowhere", &[]).await.unwrap();
        assert!(unknown.is_empty());

        let arity = store
            .execute("INSERT INTO t (a, b) VALUES (?, ?)", &[1i32.into()])
            .await;
        assert!(matches!(arity, Err(ExecutionError::Invalid(_))));

        let syntax = store.execute("DROP TABLE t", &[]).await;
        assert!(matches!(syntax, Err(ExecutionError::Invalid(_))));

        assert_eq!(store.statements().len(), 3);
        store.clear_statements();
        assert!(store.statements().is_empty());
    }
}
