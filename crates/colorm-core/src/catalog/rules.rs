//! Declarative validation rules attached to a field.

use std::fmt;
use std::sync::Arc;

use colorm_proto::Value;
use regex::Regex;
use serde::Deserialize;

use crate::error::Error;

/// Outcome of a custom rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The value passed.
    Valid,
    /// The value failed without a message; a generic one is reported.
    Invalid,
    /// The value failed with this message.
    Message(String),
}

impl From<bool> for RuleOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            RuleOutcome::Valid
        } else {
            RuleOutcome::Invalid
        }
    }
}

impl From<String> for RuleOutcome {
    fn from(message: String) -> Self {
        RuleOutcome::Message(message)
    }
}

impl From<&str> for RuleOutcome {
    fn from(message: &str) -> Self {
        RuleOutcome::Message(message.to_string())
    }
}

/// A caller-supplied predicate invoked with the raw input value.
pub type CustomRule = Arc<dyn Fn(&Value) -> RuleOutcome + Send + Sync>;

/// The bag of constraints checked for one field.
///
/// Only `required` has an ordering guarantee: it is evaluated first and a
/// failure skips every other rule for the field.
#[derive(Clone, Default)]
pub struct RuleSet {
    /// Value must be present, non-null and not the empty string.
    pub required: bool,
    /// Minimum string length, in characters.
    pub min_length: Option<usize>,
    /// Maximum string length, in characters.
    pub max_length: Option<usize>,
    /// Minimum numeric value.
    pub min: Option<f64>,
    /// Maximum numeric value.
    pub max: Option<f64>,
    /// Pattern a string must match.
    pub pattern: Option<Regex>,
    /// String must look like an email address.
    pub is_email: bool,
    /// String must parse as an absolute URL.
    pub is_url: bool,
    /// String must parse as JSON.
    pub is_json: bool,
    /// Custom predicate.
    pub custom: Option<CustomRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a value.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the minimum string length.
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    /// Set the maximum string length.
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Set the minimum numeric value.
    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    /// Set the maximum numeric value.
    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    /// Set the pattern. Fails if the expression does not compile.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, Error> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Schema(format!("invalid pattern '{}': {}", pattern, e)))?;
        self.pattern = Some(regex);
        Ok(self)
    }

    /// Require an email address.
    pub fn email(mut self) -> Self {
        self.is_email = true;
        self
    }

    /// Require a URL.
    pub fn url(mut self) -> Self {
        self.is_url = true;
        self
    }

    /// Require a JSON document.
    pub fn json(mut self) -> Self {
        self.is_json = true;
        self
    }

    /// Attach a custom predicate.
    pub fn custom<F, R>(mut self, rule: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<RuleOutcome>,
    {
        self.custom = Some(Arc::new(move |value: &Value| -> RuleOutcome {
            rule(value).into()
        }));
        self
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("is_email", &self.is_email)
            .field("is_url", &self.is_url)
            .field("is_json", &self.is_json)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Serializable form of a [`RuleSet`], as written in a JSON declaration.
///
/// `custom` predicates cannot be declared this way.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleDecl {
    #[serde(default)]
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
    #[serde(default)]
    pub is_email: bool,
    #[serde(default)]
    pub is_url: bool,
    #[serde(default)]
    pub is_json: bool,
}

impl TryFrom<RuleDecl> for RuleSet {
    type Error = Error;

    fn try_from(decl: RuleDecl) -> Result<Self, Self::Error> {
        let mut rules = RuleSet {
            required: decl.required,
            min_length: decl.min_length,
            max_length: decl.max_length,
            min: decl.min,
            max: decl.max,
            pattern: None,
            is_email: decl.is_email,
            is_url: decl.is_url,
            is_json: decl.is_json,
            custom: None,
        };
        if let Some(pattern) = decl.pattern {
            rules = rules.pattern(&pattern)?;
        }
        Ok(rules)
    }
}
