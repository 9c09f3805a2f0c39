//! Table schemas.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::field::{FieldDecl, FieldSpec};
use crate::error::Error;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Immutable description of one table.
///
/// Built once through [`SchemaBuilder`] (or [`Schema::from_json`]) and then
/// shared read-only by every operation on the table.
#[derive(Debug, Clone)]
pub struct Schema {
    table: String,
    keyspace: Option<String>,
    fields: Vec<FieldSpec>,
    key: Vec<String>,
    clustering: Vec<String>,
    indexes: Vec<String>,
    unique_fields: Vec<String>,
}

impl Schema {
    /// Start building a schema for `table`.
    pub fn builder(table: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(table)
    }

    /// Compile the JSON declaration surface
    /// `{fields, key, clustering?, indexes?, unique?}`.
    pub fn from_json(table: impl Into<String>, json: serde_json::Value) -> Result<Self, Error> {
        let def: SchemaDef = serde_json::from_value(json)
            .map_err(|e| Error::Schema(format!("invalid declaration: {}", e)))?;
        def.compile(table)
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Keyspace, if the schema is pinned to one.
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    /// Name used in statements: `keyspace.table` or just `table`.
    pub fn qualified_name(&self) -> String {
        match &self.keyspace {
            Some(keyspace) => format!("{}.{}", keyspace, self.table),
            None => self.table.clone(),
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Partition key columns.
    pub fn key(&self) -> &[String] {
        &self.key
    }

    /// Clustering columns.
    pub fn clustering(&self) -> &[String] {
        &self.clustering
    }

    /// Declared secondary indexes.
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    /// Every primary key column: partition key, then clustering columns.
    pub fn primary_key(&self) -> impl Iterator<Item = &str> {
        self.key
            .iter()
            .chain(self.clustering.iter())
            .map(String::as_str)
    }

    /// Check if `name` is part of the primary key.
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key().any(|k| k == name)
    }

    /// Union of the schema-level unique list and every field marked unique,
    /// deduplicated, in field declaration order.
    pub fn unique_fields(&self) -> &[String] {
        &self.unique_fields
    }

    /// Fields the store can look up without a filtering scan: declared
    /// indexes and the first partition key column.
    pub fn indexed_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| self.is_indexed(name))
            .collect()
    }

    /// Check if equality lookups on `name` are index-backed.
    pub fn is_indexed(&self, name: &str) -> bool {
        self.key.first().is_some_and(|k| k == name) || self.indexes.iter().any(|i| i == name)
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    table: String,
    keyspace: Option<String>,
    fields: Vec<FieldSpec>,
    key: Vec<String>,
    clustering: Vec<String>,
    indexes: Vec<String>,
    unique: Vec<String>,
    error: Option<Error>,
}

impl SchemaBuilder {
    /// Create a builder for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            keyspace: None,
            fields: Vec::new(),
            key: Vec::new(),
            clustering: Vec::new(),
            indexes: Vec::new(),
            unique: Vec::new(),
            error: None,
        }
    }

    /// Pin the table to a keyspace.
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Add a field from a textual type tag. Tag errors surface from
    /// [`build`](Self::build).
    pub fn field(mut self, name: impl Into<String>, tag: &str) -> Self {
        match FieldSpec::parse(name, tag) {
            Ok(field) => self.fields.push(field),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Add a fully specified field.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the partition key.
    pub fn key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the clustering columns.
    pub fn clustering<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clustering = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the secondary indexes.
    pub fn indexes<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the schema-level unique fields.
    pub fn unique<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Check invariants and produce the schema.
    pub fn build(self) -> Result<Schema, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }

        check_identifier("table", &self.table)?;
        if let Some(keyspace) = &self.keyspace {
            check_identifier("keyspace", keyspace)?;
        }
        if self.key.is_empty() {
            return Err(Error::Schema(format!(
                "table {} must declare at least one key column",
                self.table
            )));
        }

        for (i, field) in self.fields.iter().enumerate() {
            check_identifier("field", &field.name)?;
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::Schema(format!(
                    "field '{}' is declared twice in {}",
                    field.name, self.table
                )));
            }
        }

        let declared = |list: &'static str, names: &[String]| -> Result<(), Error> {
            match names
                .iter()
                .find(|n| !self.fields.iter().any(|f| &f.name == *n))
            {
                Some(missing) => Err(Error::Schema(format!(
                    "{} column '{}' is not a field of {}",
                    list, missing, self.table
                ))),
                None => Ok(()),
            }
        };
        declared("key", &self.key)?;
        declared("clustering", &self.clustering)?;
        declared("index", &self.indexes)?;
        declared("unique", &self.unique)?;

        let unique_fields = self
            .fields
            .iter()
            .filter(|f| f.unique || self.unique.contains(&f.name))
            .map(|f| f.name.clone())
            .collect();

        Ok(Schema {
            table: self.table,
            keyspace: self.keyspace,
            fields: self.fields,
            key: self.key,
            clustering: self.clustering,
            indexes: self.indexes,
            unique_fields,
        })
    }
}

fn check_identifier(kind: &str, name: &str) -> Result<(), Error> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(Error::Schema(format!("invalid {} name '{}'", kind, name)))
    }
}

/// The JSON declaration surface of a table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDef {
    #[serde(default)]
    pub keyspace: Option<String>,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub key: Vec<String>,
    #[serde(default)]
    pub clustering: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<String>,
    #[serde(default)]
    pub unique: Vec<String>,
}

impl SchemaDef {
    /// Resolve every field declaration and build the schema.
    pub fn compile(self, table: impl Into<String>) -> Result<Schema, Error> {
        let mut builder = SchemaBuilder::new(table)
            .key(self.key)
            .clustering(self.clustering)
            .indexes(self.indexes)
            .unique(self.unique);
        if let Some(keyspace) = self.keyspace {
            builder = builder.keyspace(keyspace);
        }

        for (name, decl) in self.fields {
            let decl: FieldDecl = serde_json::from_value(decl).map_err(|e| {
                Error::Schema(format!("invalid declaration for field '{}': {}", name, e))
            })?;
            builder = builder.with_field(decl.compile(&name)?);
        }

        builder.build()
    }
}
