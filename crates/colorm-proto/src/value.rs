//! Dynamic values exchanged with the store.

use std::fmt;
use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A dynamic value.
///
/// Application input arrives as a `Value` (usually one of `Bool`, `BigInt`,
/// `Double`, `Text`, `List` or `Map` when it came from JSON) and leaves the
/// type conversion engine as the store-native variant for the field's
/// declared type. Read results carry whatever the store produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer (`tinyint`).
    TinyInt(i8),
    /// 16-bit signed integer (`smallint`).
    SmallInt(i16),
    /// 32-bit signed integer (`int`).
    Int(i32),
    /// 64-bit signed integer (`bigint`, `counter`).
    BigInt(i64),
    /// Arbitrary-precision integer in canonical decimal form (`varint`).
    Varint(String),
    /// 64-bit floating point (`float`, `double`).
    Double(f64),
    /// Fixed-point decimal kept verbatim (`decimal`).
    Decimal(String),
    /// UTF-8 string (`text`, `ascii`, `varchar`, `json`, `nanoid`).
    Text(String),
    /// Binary data (`blob`).
    Blob(Bytes),
    /// Point in time (`timestamp`).
    Timestamp(DateTime<Utc>),
    /// Calendar date (`date`).
    Date(NaiveDate),
    /// Time of day (`time`).
    Time(NaiveTime),
    /// Duration literal such as `1h30m` (`duration`).
    Duration(String),
    /// UUID (`uuid`, `timeuuid`).
    Uuid(Uuid),
    /// IP address (`inet`).
    Inet(IpAddr),
    /// Ordered sequence (`list<T>`, or any array input).
    List(Vec<Value>),
    /// Set contents in insertion order (`set<T>`).
    Set(Vec<Value>),
    /// Key/value pairs in insertion order (`map<K, V>`, or any object input).
    Map(Vec<(Value, Value)>),
    /// Fixed-arity tuple (`tuple<T1, ..., Tn>`).
    Tuple(Vec<Value>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is null or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Check if this value is a number.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::TinyInt(_)
                | Value::SmallInt(_)
                | Value::Int(_)
                | Value::BigInt(_)
                | Value::Varint(_)
                | Value::Double(_)
                | Value::Decimal(_)
        )
    }

    /// Check if this value is a sequence (list, set or tuple).
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::List(_) | Value::Set(_) | Value::Tuple(_))
    }

    /// Truthiness: `false` for null, `false`, zero, NaN and the empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::TinyInt(i) => *i != 0,
            Value::SmallInt(i) => *i != 0,
            Value::Int(i) => *i != 0,
            Value::BigInt(i) => *i != 0,
            Value::Double(f) => *f != 0.0 && !f.is_nan(),
            Value::Varint(s) | Value::Decimal(s) => s.parse::<f64>().map_or(true, |f| f != 0.0),
            Value::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64 (any integral variant that fits).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(i) => Some(*i as i64),
            Value::SmallInt(i) => Some(*i as i64),
            Value::Int(i) => Some(*i as i64),
            Value::BigInt(i) => Some(*i),
            Value::Varint(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get as f64 (any numeric variant).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            Value::Varint(s) | Value::Decimal(s) => s.parse().ok(),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Try to get as UUID.
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::TinyInt(_) => "tinyint",
            Value::SmallInt(_) => "smallint",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Varint(_) => "varint",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Uuid(_) => "uuid",
            Value::Inet(_) => "inet",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Tuple(_) => "tuple",
        }
    }

    /// Render as a JSON value.
    ///
    /// Blobs become lowercase hex, temporal values ISO-8601 strings, map keys
    /// their display form.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::TinyInt(i) => Json::from(*i),
            Value::SmallInt(i) => Json::from(*i),
            Value::Int(i) => Json::from(*i),
            Value::BigInt(i) => Json::from(*i),
            Value::Varint(s) => s
                .parse::<i64>()
                .map(Json::from)
                .unwrap_or_else(|_| Json::String(s.clone())),
            Value::Double(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Blob(b) => Json::String(hex::encode(b)),
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            other => Json::String(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::TinyInt(i) => write!(f, "{}", i),
            Value::SmallInt(i) => write!(f, "{}", i),
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(i) => write!(f, "{}", i),
            Value::Double(d) if d.is_infinite() => {
                f.write_str(if *d > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Double(d) => write!(f, "{}", d),
            Value::Varint(s) | Value::Decimal(s) | Value::Text(s) | Value::Duration(s) => {
                f.write_str(s)
            }
            Value::Blob(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Timestamp(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::Inet(ip) => write!(f, "{}", ip),
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::BigInt(i)
                } else if n.is_u64() {
                    Value::Varint(n.to_string())
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::Text(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::TinyInt(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(Bytes::from(v))
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Blob(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<IpAddr> for Value {
    fn from(v: IpAddr) -> Self {
        Value::Inet(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_truthy() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("").is_blank());
        assert!(!Value::from(" ").is_blank());
        assert!(!Value::Int(0).is_blank());

        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Double(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("false").is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }

    #[test]
    fn test_display_matches_string_coercion() {
        assert_eq!(Value::Double(3.0).to_string(), "3");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::Double(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("a")]).to_string(),
            "1,a"
        );

        let ts = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "name": "Alice",
            "age": 30,
            "score": 1.5,
            "tags": ["a", "b"],
            "big": 18446744073709551615u64,
        });

        let value = Value::from(json);
        let Value::Map(entries) = value else {
            panic!("Expected Map");
        };

        assert_eq!(entries[0], (Value::from("name"), Value::from("Alice")));
        assert_eq!(entries[1].1, Value::BigInt(30));
        assert_eq!(entries[2].1, Value::Double(1.5));
        assert_eq!(
            entries[3].1,
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(entries[4].1, Value::Varint("18446744073709551615".into()));
    }

    #[test]
    fn test_to_json() {
        let value = Value::Map(vec![
            (Value::Int(1), Value::Blob(Bytes::from_static(b"\x01\xff"))),
            (Value::from("n"), Value::Double(f64::NAN)),
        ]);

        assert_eq!(value.to_json(), serde_json::json!({"1": "01ff", "n": null}));
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::SmallInt(7).as_i64(), Some(7));
        assert_eq!(Value::Varint("42".into()).as_f64(), Some(42.0));
        assert_eq!(Value::Decimal("1.25".into()).as_f64(), Some(1.25));
        assert_eq!(Value::from("1").as_i64(), None);
        assert!(Value::Decimal("1.25".into()).is_numeric());
        assert!(!Value::from("1").is_numeric());
    }
}
