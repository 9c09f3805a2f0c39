//! Rows and result sets returned by the store.

use crate::value::Value;

/// A single row, columns in the order the store returned them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing an existing value with the same name.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Get a column value by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Iterate over `(column, value)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Render the row as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.columns
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.set(column, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Rows produced by one statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Returned rows (empty for writes).
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Create a result set from rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// An empty result, as returned by writes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// First row, if any.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows were returned.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take ownership of the rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_set_replaces() {
        let mut row = Row::new().with("id", 1i32).with("name", "Alice");
        row.set("name", "Bob");

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("name"), Some(&Value::from("Bob")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_row_from_iter_keeps_order() {
        let row: Row = vec![("b", 2i32), ("a", 1i32)].into_iter().collect();
        let names: Vec<&str> = row.columns().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(row.to_json(), serde_json::json!({"b": 2, "a": 1}));
    }

    #[test]
    fn test_result_set_first() {
        let result = ResultSet::new(vec![Row::new().with("count", 3i64)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.first().unwrap().get("count"), Some(&Value::BigInt(3)));
        assert!(ResultSet::empty().is_empty());
    }
}
