//! Type conversion engine.
//!
//! The [`TypeRegistry`] turns application values into the store's native
//! representation for a field's declared type, generates identifiers for
//! absent ID fields and fills defaults.

mod ident;
mod scalar;

use colorm_proto::Value;

use crate::catalog::{ScalarType, Schema, TypeTag};
use crate::error::Error;
use crate::record::Record;

pub use ident::{DEFAULT_NANOID_LENGTH, NANOID_ALPHABET};

/// Dispatch table from declared type to converter, native name and
/// identifier generation.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    nanoid_length: usize,
    node_id: [u8; 6],
}

impl TypeRegistry {
    /// Create a registry with a random node id for time-based UUIDs.
    pub fn new() -> Self {
        Self {
            nanoid_length: DEFAULT_NANOID_LENGTH,
            node_id: ident::random_node_id(),
        }
    }

    /// Set the length of generated nanoids.
    pub fn with_nanoid_length(mut self, length: usize) -> Self {
        self.nanoid_length = length.max(1);
        self
    }

    /// Set the node id embedded in time-based UUIDs.
    pub fn with_node_id(mut self, node_id: [u8; 6]) -> Self {
        self.node_id = node_id;
        self
    }

    /// Convert one value to the native representation of `tag`.
    ///
    /// Null converts to null for every type; identifier generation only
    /// happens in [`convert_object`](Self::convert_object).
    pub fn convert(&self, value: Value, tag: &TypeTag) -> Result<Value, Error> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match tag {
            TypeTag::Scalar(scalar) => scalar::coerce(value, *scalar),
            TypeTag::List(element) => {
                let items = sequence(value, tag)?;
                Ok(Value::List(self.convert_elements(items, *element)?))
            }
            TypeTag::Set(element) => {
                let items = sequence(value, tag)?;
                Ok(Value::Set(self.convert_elements(items, *element)?))
            }
            TypeTag::Map(key_type, value_type) => {
                let Value::Map(entries) = value else {
                    return Err(mismatch(tag, format!("expected a map, got {}", value.kind())));
                };
                entries
                    .into_iter()
                    .map(|(k, v)| {
                        Ok((
                            self.convert_element(k, *key_type)?,
                            self.convert_element(v, *value_type)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, Error>>()
                    .map(Value::Map)
            }
            TypeTag::Tuple(types) => {
                let items = sequence(value, tag)?;
                if items.len() != types.len() {
                    return Err(mismatch(
                        tag,
                        format!("expected {} elements, got {}", types.len(), items.len()),
                    ));
                }
                items
                    .into_iter()
                    .zip(types)
                    .map(|(item, scalar)| self.convert(item, &TypeTag::Scalar(*scalar)))
                    .collect::<Result<Vec<_>, Error>>()
                    .map(Value::Tuple)
            }
        }
    }

    fn convert_elements(&self, items: Vec<Value>, element: ScalarType) -> Result<Vec<Value>, Error> {
        items
            .into_iter()
            .map(|item| self.convert_element(item, element))
            .collect()
    }

    /// Collection elements are only coerced for numeric and temporal types.
    fn convert_element(&self, value: Value, element: ScalarType) -> Result<Value, Error> {
        if element.is_numeric() || element.is_temporal() {
            self.convert(value, &TypeTag::Scalar(element))
        } else {
            Ok(value)
        }
    }

    /// Generate a fresh identifier for identifier types.
    pub fn generate(&self, scalar: ScalarType) -> Option<Value> {
        match scalar {
            ScalarType::Uuid => Some(Value::Uuid(ident::random_uuid())),
            ScalarType::TimeUuid => Some(Value::Uuid(ident::time_uuid(&self.node_id))),
            ScalarType::NanoId => Some(Value::Text(ident::nanoid(self.nanoid_length))),
            _ => None,
        }
    }

    /// Convert a full write input.
    ///
    /// Every present field is converted. Then, for each declared field still
    /// absent, an identifier is generated for ID types, and otherwise the
    /// field default is applied. A null ID field counts as absent; for every
    /// other field an explicit null or empty string is kept as given.
    pub fn convert_object(&self, record: Record, schema: &Schema) -> Result<Record, Error> {
        let mut converted = Record::new();

        for (name, value) in record {
            let field = schema.get_field(&name).ok_or_else(|| Error::UnknownField {
                table: schema.table().to_string(),
                field: name.clone(),
            })?;
            if value.is_null() && field.field_type.is_identifier() {
                continue;
            }
            let value = self
                .convert(value, &field.field_type)
                .map_err(|e| e.for_field(&name))?;
            converted.insert(name, value);
        }

        for field in schema.fields() {
            if converted.contains_key(&field.name) {
                continue;
            }
            if let Some(id) = field.field_type.scalar().and_then(|s| self.generate(s)) {
                converted.insert(field.name.clone(), id);
            } else if let Some(default) = &field.default {
                let value = self
                    .convert(default.produce(), &field.field_type)
                    .map_err(|e| e.for_field(&field.name))?;
                converted.insert(field.name.clone(), value);
            }
        }

        Ok(converted)
    }

    /// Convert only the fields present in `record`, without generating
    /// identifiers or applying defaults. Used for partial updates.
    pub fn convert_present(&self, record: Record, schema: &Schema) -> Result<Record, Error> {
        record
            .into_iter()
            .map(|(name, value)| {
                let field = schema.get_field(&name).ok_or_else(|| Error::UnknownField {
                    table: schema.table().to_string(),
                    field: name.clone(),
                })?;
                let value = self
                    .convert(value, &field.field_type)
                    .map_err(|e| e.for_field(&name))?;
                Ok((name, value))
            })
            .collect()
    }

    /// Convert predicate values with their field types. Every key must be a
    /// declared field, since keys become column names in the statement text.
    pub fn convert_where(&self, record: Record, schema: &Schema) -> Result<Record, Error> {
        self.convert_present(record, schema)
    }

    /// The store's native type name for a declared tag.
    pub fn ddl_type_name(&self, tag: &TypeTag) -> String {
        tag.native_name()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch(tag: &TypeTag, reason: String) -> Error {
    Error::Conversion {
        field: String::new(),
        type_name: tag.to_string(),
        reason,
    }
}

fn sequence(value: Value, tag: &TypeTag) -> Result<Vec<Value>, Error> {
    match value {
        Value::List(items) | Value::Set(items) | Value::Tuple(items) => Ok(items),
        other => Err(mismatch(
            tag,
            format!("expected a sequence, got {}", other.kind()),
        )),
    }
}
