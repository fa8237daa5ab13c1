//! Cell values, primary keys and typed extraction

use crate::ColumnType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single cell of a [`crate::Row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(String),
    Char(char),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::Char(_) => "char",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Uuid(_) => "uuid",
        }
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Short(v) => Self::Short(v),
            Key::Int(v) => Self::Int(v),
            Key::Long(v) => Self::Long(v),
            Key::Char(v) => Self::Char(v),
            Key::Text(v) => Self::Text(v),
            Key::Uuid(v) => Self::Uuid(v),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    DateTime<Utc> => DateTime,
    Uuid => Uuid,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// PRIMARY KEYS
// ============================================================================

/// A primary-key value. Only key-capable column types have a variant here,
/// so keys always have total equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    Short(i16),
    Int(i32),
    Long(i64),
    Char(char),
    Text(String),
    Uuid(Uuid),
}

impl Key {
    /// Extract a key from a cell value. `None` for null and non-key kinds.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Short(v) => Some(Self::Short(*v)),
            Value::Int(v) => Some(Self::Int(*v)),
            Value::Long(v) => Some(Self::Long(*v)),
            Value::Char(v) => Some(Self::Char(*v)),
            Value::Text(v) => Some(Self::Text(v.clone())),
            Value::Uuid(v) => Some(Self::Uuid(*v)),
            _ => None,
        }
    }

    /// Normalize this key to the representation of a primary-key column.
    ///
    /// Integral keys convert between widths when the value fits, so
    /// `Key::Int(42)` addresses the same row of a `BIGINT` table as
    /// `Key::Long(42)`. Returns `None` when the key cannot address the column.
    pub fn coerce_to(&self, column_type: &ColumnType) -> Option<Self> {
        let integral = match self {
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        };

        match (column_type, integral) {
            (ColumnType::Short, Some(v)) => i16::try_from(v).ok().map(Self::Short),
            (ColumnType::Integer, Some(v)) => i32::try_from(v).ok().map(Self::Int),
            (ColumnType::Long, Some(v)) => Some(Self::Long(v)),
            (_, Some(_)) => None,
            (ColumnType::Text, None) => match self {
                Self::Text(_) => Some(self.clone()),
                _ => None,
            },
            (ColumnType::Varchar { length }, None) => match self {
                Self::Text(s) if s.chars().count() <= *length as usize => Some(self.clone()),
                _ => None,
            },
            (ColumnType::Char, None) => match self {
                Self::Char(_) => Some(self.clone()),
                _ => None,
            },
            (ColumnType::Uuid, None) => match self {
                Self::Uuid(_) => Some(self.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Char(v) => write!(f, "'{}'", v),
            Self::Text(v) => write!(f, "\"{}\"", v),
            Self::Uuid(v) => write!(f, "{}", v),
        }
    }
}

impl From<i16> for Key {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<char> for Key {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Uuid> for Key {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

// ============================================================================
// TYPED EXTRACTION
// ============================================================================

/// Conversion from a cell value into a field type of a generated struct.
///
/// Returns `None` when the value kind does not fit. Integral and floating
/// values widen losslessly (`Short` → `i32`, `Float` → `f64`).
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for i16 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Short(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Short(v) => Some(i32::from(*v)),
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for char {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Char(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) | Value::Decimal(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uuid(v) => Some(*v),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
