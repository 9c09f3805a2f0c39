//! Per-family scalar coercions.

use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use colorm_proto::Value;
use uuid::Uuid;

use crate::catalog::ScalarType;
use crate::error::Error;

fn fail(scalar: ScalarType, reason: impl Into<String>) -> Error {
    Error::Conversion {
        field: String::new(),
        type_name: scalar.name().to_string(),
        reason: reason.into(),
    }
}

fn unsupported(scalar: ScalarType, value: &Value) -> Error {
    fail(scalar, format!("unsupported input of type {}", value.kind()))
}

/// Coerce a non-null value into the native representation of `scalar`.
///
/// Identifier types are passed through (text is parsed for UUID types);
/// generation for absent identifiers happens at the record level.
pub(crate) fn coerce(value: Value, scalar: ScalarType) -> Result<Value, Error> {
    match scalar {
        ScalarType::Text | ScalarType::Ascii | ScalarType::Varchar => Ok(Value::Text(match value {
            Value::Text(s) => s,
            other => other.to_string(),
        })),
        ScalarType::Int => {
            let n = parse_integer(&value, scalar)?;
            i32::try_from(n)
                .map(Value::Int)
                .map_err(|_| fail(scalar, format!("{} is out of range", n)))
        }
        ScalarType::SmallInt => {
            let n = parse_integer(&value, scalar)?;
            i16::try_from(n)
                .map(Value::SmallInt)
                .map_err(|_| fail(scalar, format!("{} is out of range", n)))
        }
        ScalarType::TinyInt => {
            let n = parse_integer(&value, scalar)?;
            i8::try_from(n)
                .map(Value::TinyInt)
                .map_err(|_| fail(scalar, format!("{} is out of range", n)))
        }
        ScalarType::BigInt | ScalarType::Counter => to_long(&value, scalar).map(Value::BigInt),
        ScalarType::Varint => to_varint(&value, scalar).map(Value::Varint),
        ScalarType::Float | ScalarType::Double => to_double(&value, scalar).map(Value::Double),
        ScalarType::Decimal => match value {
            Value::Text(s) => Ok(Value::Decimal(s)),
            Value::Decimal(s) => Ok(Value::Decimal(s)),
            other if other.is_numeric() => Ok(Value::Decimal(other.to_string())),
            other => Err(unsupported(scalar, &other)),
        },
        ScalarType::Boolean => Ok(Value::Bool(value.is_truthy())),
        ScalarType::Timestamp => to_timestamp(&value, scalar).map(Value::Timestamp),
        ScalarType::Date => to_date(&value, scalar).map(Value::Date),
        ScalarType::Time => to_time(&value, scalar).map(Value::Time),
        ScalarType::Duration => Ok(Value::Duration(match value {
            Value::Duration(s) | Value::Text(s) => s,
            other => other.to_string(),
        })),
        ScalarType::Blob => to_blob(value, scalar).map(Value::Blob),
        ScalarType::Inet => match value {
            Value::Inet(ip) => Ok(Value::Inet(ip)),
            Value::Text(s) => s
                .trim()
                .parse::<IpAddr>()
                .map(Value::Inet)
                .map_err(|_| fail(scalar, format!("'{}' is not an IP address", s))),
            other => Err(unsupported(scalar, &other)),
        },
        ScalarType::Uuid | ScalarType::TimeUuid => match value {
            Value::Uuid(u) => Ok(Value::Uuid(u)),
            Value::Text(s) => Uuid::parse_str(s.trim())
                .map(Value::Uuid)
                .map_err(|e| fail(scalar, format!("'{}' is not a UUID: {}", s, e))),
            other => Err(unsupported(scalar, &other)),
        },
        ScalarType::NanoId => Ok(Value::Text(match value {
            Value::Text(s) => s,
            other => other.to_string(),
        })),
        ScalarType::Json => match value {
            Value::Text(s) => Ok(Value::Text(s)),
            other => serde_json::to_string(&other.to_json())
                .map(Value::Text)
                .map_err(|e| fail(scalar, e.to_string())),
        },
    }
}

/// Base-10 integer parse: numbers are truncated, text is read up to the
/// first non-digit after an optional sign.
fn parse_integer(value: &Value, scalar: ScalarType) -> Result<i64, Error> {
    match value {
        Value::Double(f) => {
            if f.is_finite() && f.trunc().abs() < i64::MAX as f64 {
                Ok(f.trunc() as i64)
            } else {
                Err(fail(scalar, format!("{} is not an integer", f)))
            }
        }
        Value::Text(s) | Value::Decimal(s) | Value::Varint(s) => {
            let digits = leading_integer(s);
            digits
                .parse::<i64>()
                .map_err(|_| fail(scalar, format!("'{}' is not an integer", s)))
        }
        other => other.as_i64().ok_or_else(|| unsupported(scalar, other)),
    }
}

/// The optional sign plus leading digits of `s`, after leading whitespace.
fn leading_integer(s: &str) -> &str {
    let s = s.trim_start();
    let sign = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign..].bytes().take_while(u8::is_ascii_digit).count();
    &s[..sign + digits]
}

fn to_long(value: &Value, scalar: ScalarType) -> Result<i64, Error> {
    match value {
        Value::Double(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(*f as i64),
        Value::Text(s) | Value::Varint(s) | Value::Decimal(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| fail(scalar, format!("'{}' is not a 64-bit integer", s))),
        other => other.as_i64().ok_or_else(|| unsupported(scalar, other)),
    }
}

fn to_varint(value: &Value, scalar: ScalarType) -> Result<String, Error> {
    let text = match value {
        Value::Double(f) if f.fract() == 0.0 && f.is_finite() => format!("{:.0}", f),
        Value::Text(s) | Value::Varint(s) | Value::Decimal(s) => s.trim().to_string(),
        other => match other.as_i64() {
            Some(n) => n.to_string(),
            None => return Err(unsupported(scalar, other)),
        },
    };

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail(scalar, format!("'{}' is not an integer", text)));
    }

    let digits = digits.trim_start_matches('0');
    Ok(match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{}", digits),
        (false, false) => digits.to_string(),
    })
}

fn to_double(value: &Value, scalar: ScalarType) -> Result<f64, Error> {
    match value {
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| fail(scalar, format!("'{}' is not a number", s))),
        other => other.as_f64().ok_or_else(|| unsupported(scalar, other)),
    }
}

fn millis_to_timestamp(millis: i64, scalar: ScalarType) -> Result<DateTime<Utc>, Error> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| fail(scalar, format!("{} is out of range", millis)))
}

fn to_timestamp(value: &Value, scalar: ScalarType) -> Result<DateTime<Utc>, Error> {
    match value {
        Value::Timestamp(t) => Ok(*t),
        Value::Date(d) => Ok(d.and_time(NaiveTime::MIN).and_utc()),
        Value::Double(f) if f.is_finite() => millis_to_timestamp(*f as i64, scalar),
        Value::Text(s) => parse_timestamp(s.trim())
            .ok_or_else(|| fail(scalar, format!("'{}' is not a timestamp", s))),
        other => match other.as_i64() {
            Some(millis) => millis_to_timestamp(millis, scalar),
            None => Err(unsupported(scalar, other)),
        },
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

fn to_date(value: &Value, scalar: ScalarType) -> Result<NaiveDate, Error> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| parse_timestamp(s.trim()).map(|t| t.date_naive()))
            .ok_or_else(|| fail(scalar, format!("'{}' is not a date", s))),
        other => to_timestamp(other, scalar).map(|t| t.date_naive()),
    }
}

fn to_time(value: &Value, scalar: ScalarType) -> Result<NaiveTime, Error> {
    match value {
        Value::Time(t) => Ok(*t),
        Value::Timestamp(t) => Ok(t.time()),
        Value::Text(s) => ["%H:%M:%S%.f", "%H:%M"]
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(s.trim(), format).ok())
            .ok_or_else(|| fail(scalar, format!("'{}' is not a time of day", s))),
        other => {
            // Integers are nanoseconds since midnight.
            let nanos = other.as_i64().ok_or_else(|| unsupported(scalar, other))?;
            let secs = u32::try_from(nanos.div_euclid(1_000_000_000)).ok();
            let frac = nanos.rem_euclid(1_000_000_000) as u32;
            secs.filter(|_| nanos >= 0)
                .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, frac))
                .ok_or_else(|| fail(scalar, format!("{} is out of range", nanos)))
        }
    }
}

fn to_blob(value: Value, scalar: ScalarType) -> Result<Bytes, Error> {
    match value {
        Value::Blob(b) => Ok(b),
        Value::Text(s) => Ok(Bytes::from(s.into_bytes())),
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| fail(scalar, format!("{} is not a byte", item)))
            })
            .collect::<Result<Vec<u8>, Error>>()
            .map(Bytes::from),
        other => Err(unsupported(scalar, &other)),
    }
}
