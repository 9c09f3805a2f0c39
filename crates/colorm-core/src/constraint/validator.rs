//! Rule evaluation for write input.
//!
//! The Validator checks every declared field's rule set against a record
//! and collects human-readable violations.

use colorm_proto::Value;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{FieldSpec, RuleOutcome, RuleSet, Schema};
use crate::record::Record;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Validator for a table's declared rules.
pub struct Validator<'a> {
    schema: &'a Schema,
}

impl<'a> Validator<'a> {
    /// Create a validator for `schema`.
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validate `record`, returning every violation in field-declaration
    /// order.
    ///
    /// In update mode, fields absent from the record are skipped entirely.
    pub fn validate(&self, record: &Record, is_update: bool) -> Vec<String> {
        let mut violations = Vec::new();

        for field in self.schema.fields() {
            let Some(rules) = &field.rules else {
                continue;
            };
            let value = record.get(&field.name);
            if is_update && value.is_none() {
                continue;
            }
            check_field(field, rules, value, &mut violations);
        }

        violations
    }
}

fn check_field(field: &FieldSpec, rules: &RuleSet, value: Option<&Value>, out: &mut Vec<String>) {
    let name = &field.name;

    let value = match value {
        Some(value) if !value.is_blank() => value,
        _ => {
            if rules.required {
                out.push(format!("{} is required", name));
            }
            return;
        }
    };

    if let Value::Text(s) = value {
        check_string(name, rules, s, out);
    }

    if value.is_numeric() {
        if let Some(n) = value.as_f64() {
            if let Some(min) = rules.min {
                if n < min {
                    out.push(format!("{} must be at least {}", name, min));
                }
            }
            if let Some(max) = rules.max {
                if n > max {
                    out.push(format!("{} must be at most {}", name, max));
                }
            }
        }
    }

    if let Some(custom) = &rules.custom {
        match custom(value) {
            RuleOutcome::Valid => {}
            RuleOutcome::Invalid => out.push(format!("{} is invalid", name)),
            RuleOutcome::Message(message) => out.push(message),
        }
    }
}

fn check_string(name: &str, rules: &RuleSet, s: &str, out: &mut Vec<String>) {
    let length = s.chars().count();

    if let Some(min) = rules.min_length {
        if length < min {
            out.push(format!("{} must be at least {} characters", name, min));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            out.push(format!("{} must be at most {} characters", name, max));
        }
    }
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(s) {
            out.push(format!("{} format is invalid", name));
        }
    }
    if rules.is_email && !EMAIL.is_match(s) {
        out.push(format!("{} must be a valid email", name));
    }
    if rules.is_url && url::Url::parse(s).is_err() {
        out.push(format!("{} must be a valid URL", name));
    }
    if rules.is_json && serde_json::from_str::<serde_json::Value>(s).is_err() {
        out.push(format!("{} must be valid JSON", name));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::catalog::FieldSpec;
    use crate::record;

    fn schema_with(field: FieldSpec) -> Schema {
        Schema::builder("things")
            .field("id", "uuid")
            .with_field(field)
            .key(["id"])
            .build()
            .unwrap()
    }

    fn text_field(name: &str, rules: RuleSet) -> FieldSpec {
        FieldSpec::parse(name, "text").unwrap().with_rules(rules)
    }

    #[test]
    fn test_min_length_single_violation() {
        let schema = schema_with(text_field("name", RuleSet::new().min_length(2)));
        let violations = Validator::new(&schema).validate(&record! { "name" => "J" }, false);
        assert_eq!(violations, vec!["name must be at least 2 characters".to_string()]);
    }

    #[test]
    fn test_required_short_circuits_field() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let rules = RuleSet::new().required().min_length(3).custom(move |_: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });
        let schema = schema_with(text_field("name", rules));
        let validator = Validator::new(&schema);

        for input in [record! {}, record! { "name" => Value::Null }, record! { "name" => "" }] {
            assert_eq!(validator.validate(&input, false), vec!["name is required".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_absent_optional_skips_rules() {
        let schema = schema_with(text_field("bio", RuleSet::new().min_length(10).email()));
        let validator = Validator::new(&schema);
        assert!(validator.validate(&record! {}, false).is_empty());
        assert!(validator.validate(&record! { "bio" => "" }, false).is_empty());
    }

    #[test]
    fn test_update_mode_skips_absent_fields() {
        let schema = schema_with(text_field("name", RuleSet::new().required()));
        let validator = Validator::new(&schema);

        assert!(validator.validate(&record! {}, true).is_empty());
        assert_eq!(
            validator.validate(&record! { "name" => "" }, true),
            vec!["name is required".to_string()]
        );
    }

    #[test]
    fn test_string_checks_do_not_short_circuit() {
        let rules = RuleSet::new()
            .max_length(3)
            .pattern("^[0-9]+$")
            .unwrap()
            .email()
            .url()
            .json();
        let schema = schema_with(text_field("tag", rules));

        let violations = Validator::new(&schema).validate(&record! { "tag" => "hello" }, false);
        assert_eq!(
            violations,
            vec![
                "tag must be at most 3 characters",
                "tag format is invalid",
                "tag must be a valid email",
                "tag must be a valid URL",
                "tag must be valid JSON",
            ]
        );
    }

    #[test]
    fn test_syntactic_checks_accept_valid_input() {
        let schema = Schema::builder("links")
            .field("id", "uuid")
            .with_field(text_field("email", RuleSet::new().email()))
            .with_field(text_field("site", RuleSet::new().url()))
            .with_field(text_field("meta", RuleSet::new().json()))
            .key(["id"])
            .build()
            .unwrap();

        let input = record! {
            "email" => "a@b.com",
            "site" => "https://example.com/path?q=1",
            "meta" => r#"{"a": [1, 2]}"#,
        };
        assert!(Validator::new(&schema).validate(&input, false).is_empty());
    }

    #[test]
    fn test_numeric_bounds() {
        let field = FieldSpec::parse("age", "int")
            .unwrap()
            .with_rules(RuleSet::new().min(18.0).max(120.5));
        let schema = schema_with(field);
        let validator = Validator::new(&schema);

        assert_eq!(
            validator.validate(&record! { "age" => 3i32 }, false),
            vec!["age must be at least 18".to_string()]
        );
        assert_eq!(
            validator.validate(&record! { "age" => 200.0 }, false),
            vec!["age must be at most 120.5".to_string()]
        );
        assert!(validator.validate(&record! { "age" => 40i64 }, false).is_empty());
        // Length and numeric rules only apply to their own kinds of value.
        assert!(validator.validate(&record! { "age" => "3" }, false).is_empty());
    }

    #[test]
    fn test_custom_messages() {
        let field = FieldSpec::parse("code", "text").unwrap().with_rules(
            RuleSet::new().custom(|v: &Value| match v.as_str() {
                Some("ok") => RuleOutcome::Valid,
                Some("bad") => RuleOutcome::Message("code is not allowed".into()),
                _ => RuleOutcome::Invalid,
            }),
        );
        let schema = schema_with(field);
        let validator = Validator::new(&schema);

        assert!(validator.validate(&record! { "code" => "ok" }, false).is_empty());
        assert_eq!(
            validator.validate(&record! { "code" => "bad" }, false),
            vec!["code is not allowed".to_string()]
        );
        assert_eq!(
            validator.validate(&record! { "code" => "meh" }, false),
            vec!["code is invalid".to_string()]
        );
    }

    #[test]
    fn test_violations_accumulate_in_declaration_order() {
        let schema = Schema::builder("users")
            .field("id", "uuid")
            .with_field(text_field("name", RuleSet::new().required()))
            .with_field(text_field("email", RuleSet::new().required().email()))
            .key(["id"])
            .build()
            .unwrap();

        let violations =
            Validator::new(&schema).validate(&record! { "email" => "nope" }, false);
        assert_eq!(
            violations,
            vec!["name is required", "email must be a valid email"]
        );
    }
}
