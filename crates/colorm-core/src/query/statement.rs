//! Statement text and parameter lists.

use std::fmt;

use colorm_proto::Value;

use crate::catalog::Schema;
use crate::record::Record;

/// Statement text with its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement text with `?` markers.
    pub text: String,
    /// Parameters bound to the markers, in order.
    pub params: Vec<Value>,
}

impl Statement {
    fn new(text: String, params: Vec<Value>) -> Self {
        Self { text, params }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Options for a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
    /// Permit the store to filter on non-indexed columns.
    pub allow_filtering: bool,
}

impl FindOptions {
    /// Default options: no limit, no filtering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Allow filtering scans.
    pub fn allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }
}

/// Build `INSERT INTO t (a, b) VALUES (?, ?)`.
///
/// Columns follow schema declaration order; fields absent from `record` are
/// not written.
pub fn insert(schema: &Schema, record: &Record) -> Statement {
    let mut columns = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());

    for field in schema.fields() {
        if let Some(value) = record.get(&field.name) {
            columns.push(field.name.as_str());
            params.push(value.clone());
        }
    }

    let markers = vec!["?"; columns.len()].join(", ");
    let text = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.qualified_name(),
        columns.join(", "),
        markers
    );
    Statement::new(text, params)
}

/// Build `SELECT * FROM t [WHERE ...] [LIMIT n] [ALLOW FILTERING]`.
pub fn select(schema: &Schema, filter: &Record, options: &FindOptions) -> Statement {
    let mut params = Vec::with_capacity(filter.len());
    let mut text = format!("SELECT * FROM {}", schema.qualified_name());
    push_where(&mut text, &mut params, filter);
    push_options(&mut text, options);
    Statement::new(text, params)
}

/// Build `SELECT COUNT(*) FROM t [WHERE ...]`.
pub fn count(schema: &Schema, filter: &Record, options: &FindOptions) -> Statement {
    let mut params = Vec::with_capacity(filter.len());
    let mut text = format!("SELECT COUNT(*) FROM {}", schema.qualified_name());
    push_where(&mut text, &mut params, filter);
    push_options(&mut text, options);
    Statement::new(text, params)
}

/// Build `UPDATE t SET a = ?, b = ? WHERE ...`.
///
/// SET columns follow schema declaration order. Returns `None` when there is
/// nothing to set.
pub fn update(schema: &Schema, set: &Record, filter: &Record) -> Option<Statement> {
    let mut assignments = Vec::with_capacity(set.len());
    let mut params = Vec::with_capacity(set.len() + filter.len());

    for field in schema.fields() {
        if let Some(value) = set.get(&field.name) {
            assignments.push(format!("{} = ?", field.name));
            params.push(value.clone());
        }
    }
    if assignments.is_empty() {
        return None;
    }

    let mut text = format!(
        "UPDATE {} SET {}",
        schema.qualified_name(),
        assignments.join(", ")
    );
    push_where(&mut text, &mut params, filter);
    Some(Statement::new(text, params))
}

/// Build `DELETE FROM t WHERE ...`.
pub fn delete(schema: &Schema, filter: &Record) -> Statement {
    let mut params = Vec::with_capacity(filter.len());
    let mut text = format!("DELETE FROM {}", schema.qualified_name());
    push_where(&mut text, &mut params, filter);
    Statement::new(text, params)
}

fn push_where(text: &mut String, params: &mut Vec<Value>, filter: &Record) {
    if filter.is_empty() {
        return;
    }
    let predicates: Vec<String> = filter
        .iter()
        .map(|(column, value)| {
            params.push(value.clone());
            format!("{} = ?", column)
        })
        .collect();
    text.push_str(" WHERE ");
    text.push_str(&predicates.join(" AND "));
}

fn push_options(text: &mut String, options: &FindOptions) {
    if let Some(limit) = options.limit {
        text.push_str(&format!(" LIMIT {}", limit));
    }
    if options.allow_filtering {
        text.push_str(" ALLOW FILTERING");
    }
}
