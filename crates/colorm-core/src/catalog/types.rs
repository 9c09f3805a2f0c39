//! Type tags recognized by the catalog.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Scalar type families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Random (v4) UUID.
    Uuid,
    /// Time-based (v1) UUID.
    TimeUuid,
    /// URL-safe random string identifier, stored as text.
    NanoId,
    /// UTF-8 string.
    Text,
    /// ASCII string.
    Ascii,
    /// Alias of text.
    Varchar,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    BigInt,
    /// 16-bit signed integer.
    SmallInt,
    /// 8-bit signed integer.
    TinyInt,
    /// Arbitrary-precision integer.
    Varint,
    /// 64-bit counter column.
    Counter,
    /// 32-bit floating point (coerced through f64).
    Float,
    /// 64-bit floating point.
    Double,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Boolean.
    Boolean,
    /// Point in time.
    Timestamp,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Duration literal.
    Duration,
    /// Binary data.
    Blob,
    /// IPv4 or IPv6 address.
    Inet,
    /// JSON document, stored as text.
    Json,
}

impl ScalarType {
    /// Every scalar type, in declaration order.
    pub const ALL: [ScalarType; 23] = [
        ScalarType::Uuid,
        ScalarType::TimeUuid,
        ScalarType::NanoId,
        ScalarType::Text,
        ScalarType::Ascii,
        ScalarType::Varchar,
        ScalarType::Int,
        ScalarType::BigInt,
        ScalarType::SmallInt,
        ScalarType::TinyInt,
        ScalarType::Varint,
        ScalarType::Counter,
        ScalarType::Float,
        ScalarType::Double,
        ScalarType::Decimal,
        ScalarType::Boolean,
        ScalarType::Timestamp,
        ScalarType::Date,
        ScalarType::Time,
        ScalarType::Duration,
        ScalarType::Blob,
        ScalarType::Inet,
        ScalarType::Json,
    ];

    /// The tag as written in a schema declaration.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Uuid => "uuid",
            ScalarType::TimeUuid => "timeuuid",
            ScalarType::NanoId => "nanoid",
            ScalarType::Text => "text",
            ScalarType::Ascii => "ascii",
            ScalarType::Varchar => "varchar",
            ScalarType::Int => "int",
            ScalarType::BigInt => "bigint",
            ScalarType::SmallInt => "smallint",
            ScalarType::TinyInt => "tinyint",
            ScalarType::Varint => "varint",
            ScalarType::Counter => "counter",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Decimal => "decimal",
            ScalarType::Boolean => "boolean",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Date => "date",
            ScalarType::Time => "time",
            ScalarType::Duration => "duration",
            ScalarType::Blob => "blob",
            ScalarType::Inet => "inet",
            ScalarType::Json => "json",
        }
    }

    /// The store's native type name used in DDL.
    ///
    /// `nanoid` and `json` have no native counterpart and are stored as text.
    pub fn native_name(&self) -> &'static str {
        match self {
            ScalarType::NanoId | ScalarType::Json => ScalarType::Text.name(),
            other => other.name(),
        }
    }

    /// Look up a scalar type by tag, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Check if values of this type are generated when absent.
    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            ScalarType::Uuid | ScalarType::TimeUuid | ScalarType::NanoId
        )
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int
                | ScalarType::BigInt
                | ScalarType::SmallInt
                | ScalarType::TinyInt
                | ScalarType::Varint
                | ScalarType::Counter
                | ScalarType::Float
                | ScalarType::Double
                | ScalarType::Decimal
        )
    }

    /// Check if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ScalarType::Timestamp | ScalarType::Date | ScalarType::Time
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed field type tag.
///
/// Collection element types are restricted to scalars.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// A scalar value.
    Scalar(ScalarType),
    /// `list<T>`.
    List(ScalarType),
    /// `set<T>`.
    Set(ScalarType),
    /// `map<K, V>`.
    Map(ScalarType, ScalarType),
    /// `tuple<T1, ..., Tn>`.
    Tuple(Vec<ScalarType>),
}

impl TypeTag {
    /// Parse a declared tag, reporting whether it was wrapped in `frozen<...>`.
    pub fn parse_declared(tag: &str) -> Result<(TypeTag, bool), Error> {
        let trimmed = tag.trim();
        if let Some(inner) = strip_wrapper(trimmed, "frozen") {
            let parsed = Self::parse_plain(inner, tag)?;
            return Ok((parsed, true));
        }
        Ok((Self::parse_plain(trimmed, tag)?, false))
    }

    fn parse_plain(tag: &str, original: &str) -> Result<TypeTag, Error> {
        let unknown = || Error::UnknownType(original.trim().to_string());

        let Some(open) = tag.find('<') else {
            return ScalarType::from_name(tag)
                .map(TypeTag::Scalar)
                .ok_or_else(unknown);
        };
        if !tag.ends_with('>') {
            return Err(unknown());
        }

        let head = tag[..open].trim().to_ascii_lowercase();
        let args = &tag[open + 1..tag.len() - 1];
        if args.contains('<') || args.contains('>') {
            return Err(unknown());
        }

        let elements = args
            .split(',')
            .map(|arg| ScalarType::from_name(arg).ok_or_else(unknown))
            .collect::<Result<Vec<_>, _>>()?;

        match (head.as_str(), elements.as_slice()) {
            ("list", [element]) => Ok(TypeTag::List(*element)),
            ("set", [element]) => Ok(TypeTag::Set(*element)),
            ("map", [key, value]) => Ok(TypeTag::Map(*key, *value)),
            ("tuple", elements) if !elements.is_empty() => Ok(TypeTag::Tuple(elements.to_vec())),
            _ => Err(unknown()),
        }
    }

    /// Get the scalar type if this is a scalar tag.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            TypeTag::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Check if this is an identifier type (generated when absent).
    pub fn is_identifier(&self) -> bool {
        self.scalar().is_some_and(|s| s.is_identifier())
    }

    /// Check if this is a collection type.
    pub fn is_collection(&self) -> bool {
        !matches!(self, TypeTag::Scalar(_))
    }

    /// The store's native type name for DDL.
    pub fn native_name(&self) -> String {
        self.render(ScalarType::native_name)
    }

    fn render(&self, name: fn(&ScalarType) -> &'static str) -> String {
        match self {
            TypeTag::Scalar(s) => name(s).to_string(),
            TypeTag::List(e) => format!("list<{}>", name(e)),
            TypeTag::Set(e) => format!("set<{}>", name(e)),
            TypeTag::Map(k, v) => format!("map<{}, {}>", name(k), name(v)),
            TypeTag::Tuple(elements) => format!(
                "tuple<{}>",
                elements.iter().map(name).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

impl FromStr for TypeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::parse_declared(s).map(|(tag, _)| tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(ScalarType::name))
    }
}

impl From<ScalarType> for TypeTag {
    fn from(scalar: ScalarType) -> Self {
        TypeTag::Scalar(scalar)
    }
}

/// Strip `name<...>` and return the inner text.
fn strip_wrapper<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let open = tag.find('<')?;
    if !tag[..open].trim().eq_ignore_ascii_case(name) || !tag.ends_with('>') {
        return None;
    }
    Some(&tag[open + 1..tag.len() - 1])
}

/// The store's native type name for a declared tag.
///
/// Fails with [`Error::UnknownType`] for tags the catalog does not recognize.
pub fn ddl_type_name(tag: &str) -> Result<String, Error> {
    tag.parse::<TypeTag>().map(|t| t.native_name())
}
