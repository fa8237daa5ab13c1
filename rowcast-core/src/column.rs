//! Column types and column descriptors

use crate::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    Short,
    Integer,
    Long,
    Float,
    Double,
    /// Fixed-point number, carried as canonical decimal text.
    Decimal { precision: u32, scale: u32 },
    Char,
    Bool,
    Text,
    /// Text with a maximum length in characters.
    Varchar { length: u32 },
    Date,
    DateTime,
    Timestamp,
    Blob,
    /// Stored as the variant name.
    Enumeration { variants: Vec<String> },
    Uuid,
}

impl ColumnType {
    /// Whether columns of this type may serve as a primary key.
    pub fn is_key_type(&self) -> bool {
        matches!(
            self,
            Self::Short
                | Self::Integer
                | Self::Long
                | Self::Text
                | Self::Varchar { .. }
                | Self::Char
                | Self::Uuid
        )
    }

    /// Whether this type can be auto-incremented.
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Short | Self::Integer | Self::Long)
    }

    /// Whether a non-null cell value fits this column type.
    ///
    /// `Null` is never accepted here; nullability is a property of the column,
    /// not the type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Short, Value::Short(_)) => true,
            (Self::Integer, Value::Int(_)) => true,
            (Self::Long, Value::Long(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Double, Value::Double(_)) => true,
            (Self::Decimal { .. }, Value::Decimal(_)) => true,
            (Self::Char, Value::Char(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Varchar { length }, Value::Text(s)) => s.chars().count() <= *length as usize,
            (Self::Date, Value::Date(_)) => true,
            (Self::DateTime | Self::Timestamp, Value::DateTime(_)) => true,
            (Self::Blob, Value::Bytes(_)) => true,
            (Self::Enumeration { variants }, Value::Text(s)) => variants.iter().any(|v| v == s),
            (Self::Uuid, Value::Uuid(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "SMALLINT"),
            Self::Integer => write!(f, "INT"),
            Self::Long => write!(f, "BIGINT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Double => write!(f, "DOUBLE"),
            Self::Decimal { precision, scale } => write!(f, "DECIMAL({}, {})", precision, scale),
            Self::Char => write!(f, "CHAR"),
            Self::Bool => write!(f, "BOOLEAN"),
            Self::Text => write!(f, "TEXT"),
            Self::Varchar { length } => write!(f, "VARCHAR({})", length),
            Self::Date => write!(f, "DATE"),
            Self::DateTime => write!(f, "DATETIME"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Blob => write!(f, "BLOB"),
            Self::Enumeration { variants } => write!(f, "ENUM({})", variants.join(", ")),
            Self::Uuid => write!(f, "UUID"),
        }
    }
}

/// A column as declared on the source table class.
///
/// This is the registration-time input; [`crate::describe`] validates it into
/// a [`ColumnDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub default: Option<String>,
    /// Rust type path that overrides the generated field type. The type must
    /// implement `From` of the column's native field type, plus `Debug`,
    /// `Clone` and `PartialEq`. Not allowed on the primary key.
    #[serde(default)]
    pub typed: Option<String>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            default: None,
            typed: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Generate this column's field as `type_path` instead of its native type.
    pub fn typed(mut self, type_path: impl Into<String>) -> Self {
        self.typed = Some(type_path.into());
        self
    }
}

/// A validated column of a [`crate::TableDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub auto_increment: bool,
    pub default: Option<String>,
    pub typed: Option<String>,
}

impl ColumnDescriptor {
    /// Whether a cell value (including `Null`) fits this column.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            self.nullable
        } else {
            self.column_type.accepts(value)
        }
    }
}

impl From<&ColumnMetadata> for ColumnDescriptor {
    fn from(meta: &ColumnMetadata) -> Self {
        Self {
            name: meta.name.clone(),
            column_type: meta.column_type.clone(),
            nullable: meta.nullable,
            auto_increment: meta.auto_increment,
            default: meta.default.clone(),
            typed: meta.typed.clone(),
        }
    }
}
