//! DDL statement rendering.
//!
//! These functions only render text. Issuing the statements, and deciding
//! when to, belongs to schema management tooling outside the record mapper.

use super::field::FieldSpec;
use super::schema::Schema;

/// Render the column type for a field, honoring `frozen` on collections.
pub fn column_type(field: &FieldSpec) -> String {
    let native = field.field_type.native_name();
    if field.frozen && field.field_type.is_collection() {
        format!("frozen<{}>", native)
    } else {
        native
    }
}

/// `CREATE TABLE IF NOT EXISTS` for the schema.
pub fn create_table(schema: &Schema) -> String {
    let mut columns: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| format!("{} {}", f.name, column_type(f)))
        .collect();

    let partition = if schema.key().len() == 1 {
        schema.key()[0].clone()
    } else {
        format!("({})", schema.key().join(", "))
    };
    let primary_key = std::iter::once(partition)
        .chain(schema.clustering().iter().cloned())
        .collect::<Vec<_>>()
        .join(", ");
    columns.push(format!("PRIMARY KEY ({})", primary_key));

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.qualified_name(),
        columns.join(", ")
    )
}

/// Index name used for `column`.
pub fn index_name(schema: &Schema, column: &str) -> String {
    format!("{}_{}_idx", schema.table(), column)
}

/// `CREATE INDEX IF NOT EXISTS` for every declared index and unique field
/// that is not already part of the primary key.
pub fn create_indexes(schema: &Schema) -> Vec<String> {
    schema
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| {
            !schema.is_primary_key(name)
                && (schema.indexes().iter().any(|i| i == name)
                    || schema.unique_fields().iter().any(|u| u == name))
        })
        .map(|name| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                index_name(schema, name),
                schema.qualified_name(),
                name
            )
        })
        .collect()
}

/// `ALTER TABLE ... ADD` for every declared field missing from `existing`.
///
/// Columns are only ever added; nothing is dropped or retyped.
pub fn add_columns(schema: &Schema, existing: &[&str]) -> Vec<String> {
    schema
        .fields()
        .iter()
        .filter(|f| !existing.contains(&f.name.as_str()))
        .map(|f| {
            format!(
                "ALTER TABLE {} ADD {} {}",
                schema.qualified_name(),
                f.name,
                column_type(f)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::{FieldSpec, ScalarType};

    fn events_schema() -> Schema {
        Schema::builder("events")
            .keyspace("app")
            .field("tenant", "text")
            .field("day", "date")
            .field("at", "timeuuid")
            .field("payload", "json")
            .field("short_id", "nanoid")
            .with_field(FieldSpec::parse("tags", "set<text>").unwrap().frozen())
            .field("counts", "map<text, int>")
            .key(["tenant", "day"])
            .clustering(["at"])
            .indexes(["payload"])
            .unique(["short_id", "tenant"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_table() {
        assert_eq!(
            create_table(&events_schema()),
            "CREATE TABLE IF NOT EXISTS app.events (tenant text, day date, at timeuuid, \
             payload text, short_id text, tags frozen<set<text>>, counts map<text, int>, \
             PRIMARY KEY ((tenant, day), at))"
        );
    }

    #[test]
    fn test_create_table_single_key() {
        let schema = Schema::builder("users")
            .field("id", "uuid")
            .with_field(FieldSpec::new("name", ScalarType::Text).frozen())
            .key(["id"])
            .build()
            .unwrap();

        assert_eq!(
            create_table(&schema),
            "CREATE TABLE IF NOT EXISTS users (id uuid, name text, PRIMARY KEY (id))"
        );
    }

    #[test]
    fn test_create_indexes_skips_primary_key() {
        assert_eq!(
            create_indexes(&events_schema()),
            vec![
                "CREATE INDEX IF NOT EXISTS events_payload_idx ON app.events (payload)".to_string(),
                "CREATE INDEX IF NOT EXISTS events_short_id_idx ON app.events (short_id)".to_string(),
            ]
        );
    }

    #[test]
    fn test_add_columns() {
        let statements = add_columns(&events_schema(), &["tenant", "day", "at", "payload", "tags"]);
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE app.events ADD short_id text".to_string(),
                "ALTER TABLE app.events ADD counts map<text, int>".to_string(),
            ]
        );
    }
}
