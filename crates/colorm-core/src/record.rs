//! Write input and converted records.

use std::collections::BTreeMap;

use colorm_proto::Value;

use crate::error::Error;

/// A mapping of field name to value.
///
/// Used for write input, `where` predicates and converted output alike.
pub type Record = BTreeMap<String, Value>;

/// Build a [`Record`] from `field => value` pairs.
///
/// ```
/// use colorm_core::record;
///
/// let user = record! { "email" => "a@b.com", "age" => 30i32 };
/// assert_eq!(user.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(
                ::std::string::String::from($field),
                $crate::proto::Value::from($value),
            );
        )+
        record
    }};
}

/// Build a record from a JSON object.
pub fn from_json(json: serde_json::Value) -> Result<Record, Error> {
    match json {
        serde_json::Value::Object(entries) => Ok(entries
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect()),
        other => Err(Error::Conversion {
            field: String::new(),
            type_name: "record".to_string(),
            reason: format!("expected a JSON object, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_macro() {
        let empty: Record = record! {};
        assert!(empty.is_empty());

        let record = record! { "name" => "Alice", "age" => 30i32, };
        assert_eq!(record.get("name"), Some(&Value::from("Alice")));
        assert_eq!(record.get("age"), Some(&Value::Int(30)));
    }

    #[test]
    fn test_from_json() {
        let record = from_json(serde_json::json!({"email": "a@b.com", "age": 3})).unwrap();
        assert_eq!(record.get("email"), Some(&Value::from("a@b.com")));
        assert_eq!(record.get("age"), Some(&Value::BigInt(3)));

        assert!(from_json(serde_json::json!([1, 2])).is_err());
    }
}
