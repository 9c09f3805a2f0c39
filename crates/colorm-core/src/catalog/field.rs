//! Field definitions for tables.

use std::fmt;
use std::sync::Arc;

use colorm_proto::Value;
use serde::Deserialize;

use super::rules::{RuleDecl, RuleSet};
use super::types::TypeTag;
use crate::error::Error;

/// Default value for a field, applied only when the input omits it.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value.
    Static(Value),
    /// Invoked once per write that needs it.
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// A fixed default.
    pub fn value(value: impl Into<Value>) -> Self {
        DefaultValue::Static(value.into())
    }

    /// A default produced by calling `f` on every fill.
    pub fn generator<F, V>(f: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        DefaultValue::Generator(Arc::new(move || f().into()))
    }

    /// Produce the default for one write.
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::Generator(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// A field definition within a table, resolved at schema build time.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field (column) name.
    pub name: String,
    /// Declared type.
    pub field_type: TypeTag,
    /// Validation rules, if any.
    pub rules: Option<RuleSet>,
    /// Default value if not provided.
    pub default: Option<DefaultValue>,
    /// Field-level uniqueness constraint.
    pub unique: bool,
    /// Collection immutability hint, only used when rendering DDL.
    pub frozen: bool,
}

impl FieldSpec {
    /// Create a field with no rules, default or constraint.
    pub fn new(name: impl Into<String>, field_type: impl Into<TypeTag>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            rules: None,
            default: None,
            unique: false,
            frozen: false,
        }
    }

    /// Create a field from a textual type tag such as `"set<int>"`.
    pub fn parse(name: impl Into<String>, tag: &str) -> Result<Self, Error> {
        let (field_type, frozen) = TypeTag::parse_declared(tag)?;
        let mut field = Self::new(name, field_type);
        field.frozen = frozen;
        Ok(field)
    }

    /// Set the validation rules.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as frozen.
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Check if this field has a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// A field declaration as written in a JSON schema: either a bare type tag
/// or a structured record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldDecl {
    /// Bare type tag, e.g. `"text"`.
    Simple(String),
    /// Structured declaration.
    Detailed(DetailedFieldDecl),
}

/// Structured field declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedFieldDecl {
    #[serde(rename = "type")]
    pub field_type: String,
    pub validate: Option<RuleDecl>,
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub frozen: bool,
}

impl FieldDecl {
    /// Resolve the declaration into a [`FieldSpec`].
    pub fn compile(self, name: &str) -> Result<FieldSpec, Error> {
        match self {
            FieldDecl::Simple(tag) => FieldSpec::parse(name, &tag),
            FieldDecl::Detailed(decl) => {
                let mut field = FieldSpec::parse(name, &decl.field_type)?;
                field.frozen |= decl.frozen;
                field.unique = decl.unique;
                if let Some(rules) = decl.validate {
                    field.rules = Some(RuleSet::try_from(rules)?);
                }
                if let Some(default) = decl.default {
                    field.default = Some(DefaultValue::Static(Value::from(default)));
                }
                Ok(field)
            }
        }
    }
}

impl From<&str> for FieldDecl {
    fn from(tag: &str) -> Self {
        FieldDecl::Simple(tag.to_string())
    }
}
