//! SQL value representation.

use std::fmt;

use bytes::Bytes;

/// A SQL value passed as a query argument or stored in a mocked row.
///
/// Equality is deep and structural: two arrays are equal when their
/// elements are pairwise equal, and values of different variants never
/// compare equal (`Int(1)` is not `BigInt(1)`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlValue {
    /// NULL value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 16-bit signed integer.
    SmallInt(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Text value.
    String(String),
    /// Binary value.
    Binary(Bytes),
    /// Array of values.
    Array(Vec<SqlValue>),
    /// Decimal value.
    #[cfg(feature = "decimal")]
    Decimal(rust_decimal::Decimal),
    /// UUID value.
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    /// Date value.
    #[cfg(feature = "chrono")]
    Date(chrono::NaiveDate),
    /// Time of day value.
    #[cfg(feature = "chrono")]
    Time(chrono::NaiveTime),
    /// Timestamp without time zone.
    #[cfg(feature = "chrono")]
    Timestamp(chrono::NaiveDateTime),
    /// Timestamp with time zone.
    #[cfg(feature = "chrono")]
    TimestampTz(chrono::DateTime<chrono::FixedOffset>),
    /// JSON document.
    #[cfg(feature = "json")]
    Json(serde_json::Value),
}

/// The kind of a [`SqlValue`], without its payload.
///
/// Used by type-constrained wildcards that accept any value of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValueKind {
    /// NULL.
    Null,
    /// Boolean.
    Bool,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Text.
    String,
    /// Binary.
    Binary,
    /// Array.
    Array,
    /// Decimal.
    Decimal,
    /// UUID.
    Uuid,
    /// Date.
    Date,
    /// Time of day.
    Time,
    /// Timestamp without time zone.
    Timestamp,
    /// Timestamp with time zone.
    TimestampTz,
    /// JSON document.
    Json,
}

impl ValueKind {
    /// Get the kind name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::SmallInt => "smallint",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Float => "real",
            Self::Double => "double",
            Self::String => "text",
            Self::Binary => "bytea",
            Self::Array => "array",
            Self::Decimal => "decimal",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestamptz",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SqlValue {
    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::SmallInt(_) => ValueKind::SmallInt,
            Self::Int(_) => ValueKind::Int,
            Self::BigInt(_) => ValueKind::BigInt,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::String(_) => ValueKind::String,
            Self::Binary(_) => ValueKind::Binary,
            Self::Array(_) => ValueKind::Array,
            #[cfg(feature = "decimal")]
            Self::Decimal(_) => ValueKind::Decimal,
            #[cfg(feature = "uuid")]
            Self::Uuid(_) => ValueKind::Uuid,
            #[cfg(feature = "chrono")]
            Self::Date(_) => ValueKind::Date,
            #[cfg(feature = "chrono")]
            Self::Time(_) => ValueKind::Time,
            #[cfg(feature = "chrono")]
            Self::Timestamp(_) => ValueKind::Timestamp,
            #[cfg(feature = "chrono")]
            Self::TimestampTz(_) => ValueKind::TimestampTz,
            #[cfg(feature = "json")]
            Self::Json(_) => ValueKind::Json,
        }
    }

    /// Get the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i64, widening smaller integers.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::BigInt(v) => Some(*v),
            Self::Int(v) => Some(i64::from(*v)),
            Self::SmallInt(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as an f64, widening `Float`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Get the elements, if the value is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[SqlValue]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "'{v}'"),
            Self::Binary(v) => {
                f.write_str("\\x")?;
                for b in v.iter() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Array(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            #[cfg(feature = "decimal")]
            Self::Decimal(v) => write!(f, "{v}"),
            #[cfg(feature = "uuid")]
            Self::Uuid(v) => write!(f, "{v}"),
            #[cfg(feature = "chrono")]
            Self::Date(v) => write!(f, "{v}"),
            #[cfg(feature = "chrono")]
            Self::Time(v) => write!(f, "{v}"),
            #[cfg(feature = "chrono")]
            Self::Timestamp(v) => write!(f, "{v}"),
            #[cfg(feature = "chrono")]
            Self::TimestampTz(v) => write!(f, "{v}"),
            #[cfg(feature = "json")]
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        Self::SmallInt(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Bytes> for SqlValue {
    fn from(v: Bytes) -> Self {
        Self::Binary(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(v))
    }
}

impl From<Vec<SqlValue>> for SqlValue {
    fn from(v: Vec<SqlValue>) -> Self {
        Self::Array(v)
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(v: Vec<String>) -> Self {
        Self::Array(v.into_iter().map(Self::String).collect())
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for SqlValue {
    fn from(v: uuid::Uuid) -> Self {
        Self::Uuid(v)
    }
}

#[cfg(feature = "decimal")]
impl From<rust_decimal::Decimal> for SqlValue {
    fn from(v: rust_decimal::Decimal) -> Self {
        Self::Decimal(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDate> for SqlValue {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveTime> for SqlValue {
    fn from(v: chrono::NaiveTime) -> Self {
        Self::Time(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDateTime> for SqlValue {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::DateTime<chrono::FixedOffset>> for SqlValue {
    fn from(v: chrono::DateTime<chrono::FixedOffset>) -> Self {
        Self::TimestampTz(v)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_never_compare_across_kinds() {
        assert_ne!(SqlValue::Int(1), SqlValue::BigInt(1));
        assert_ne!(SqlValue::Null, SqlValue::String(String::new()));
    }

    #[test]
    fn test_array_equality_is_deep() {
        let a = SqlValue::from(vec!["Three".to_owned(), "Four".to_owned()]);
        let b = SqlValue::Array(vec!["Three".into(), "Four".into()]);
        assert_eq!(a, b);
        assert_ne!(a, SqlValue::Array(vec!["Four".into(), "Three".into()]));
    }

    #[test]
    fn test_option_maps_none_to_null() {
        assert!(SqlValue::from(None::<i32>).is_null());
        assert_eq!(SqlValue::from(Some(3i64)), SqlValue::BigInt(3));
    }

    #[test]
    fn test_kind() {
        assert_eq!(SqlValue::from(42).kind(), ValueKind::Int);
        assert_eq!(SqlValue::from("x").kind(), ValueKind::String);
        assert_eq!(SqlValue::Array(vec![]).kind().name(), "array");
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlValue::from(42).to_string(), "42");
        assert_eq!(SqlValue::from("John").to_string(), "'John'");
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        assert_eq!(SqlValue::from(vec![0xde_u8, 0xad]).to_string(), "\\xdead");
        assert_eq!(
            SqlValue::Array(vec![1.into(), SqlValue::Null]).to_string(),
            "[1, NULL]"
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(SqlValue::SmallInt(4).as_i64(), Some(4));
        assert_eq!(SqlValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(SqlValue::from("a").as_str(), Some("a"));
        assert_eq!(SqlValue::Bool(true).as_bool(), Some(true));
        assert!(SqlValue::Int(1).as_bytes().is_none());
        assert_eq!(SqlValue::Array(vec![1.into()]).as_array().map(<[_]>::len), Some(1));
    }
}
