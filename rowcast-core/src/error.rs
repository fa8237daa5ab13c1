//! Error types for ROWCAST operations

use crate::{ColumnType, Key};
use thiserror::Error;

/// Malformed or underspecified table metadata. Fatal for that table at
/// generation time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Class {class_name} is not a lookup table")]
    NotALookupTable { class_name: String },

    #[error("Invalid source class name: '{class_name}'")]
    InvalidClassName { class_name: String },

    #[error("Table {table} has no columns")]
    NoColumns { table: String },

    #[error("Table {table} has no primary key column")]
    MissingPrimaryKey { table: String },

    #[error("Table {table} declares more than one primary key: {columns:?}")]
    MultiplePrimaryKeys { table: String, columns: Vec<String> },

    #[error("Primary key {column} of table {table} must not be nullable")]
    NullablePrimaryKey { table: String, column: String },

    #[error("Column {column} of table {table} has type {column_type}, which cannot be a primary key")]
    UnsupportedKeyType {
        table: String,
        column: String,
        column_type: ColumnType,
    },

    #[error("Table {table} declares column {column} more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("Table {table} has a column with an empty name")]
    EmptyColumnName { table: String },

    #[error("Column {column} of table {table} is auto-increment but not integral")]
    InvalidAutoIncrement { table: String, column: String },

    #[error("Column {column} of table {table} has an invalid type override: {reason}")]
    InvalidTypedColumn {
        table: String,
        column: String,
        reason: String,
    },
}

/// Value type generation errors. Fatal for that table at generation time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Columns {first_column} and {second_column} of {type_name} both map to field '{field}'")]
    FieldNameCollision {
        type_name: String,
        field: String,
        first_column: String,
        second_column: String,
    },

    #[error("Column '{column}' of {type_name} does not produce a usable field name")]
    InvalidFieldName { type_name: String, column: String },

    #[error("Invalid value type name: '{name}'")]
    InvalidTypeName { name: String },

    #[error("Value type {name} is already generated for class {first_class}")]
    DuplicateTypeName { name: String, first_class: String },

    #[error("Value type {type_name} has no key field")]
    MissingKeyField { type_name: String },

    #[error("Value type {type_name} records key index {key_index}, which is not its key field")]
    KeyIndexMismatch { type_name: String, key_index: usize },

    #[error("Value types {name} and {first_type} would both be written to {file_name}")]
    DuplicateFileName {
        name: String,
        first_type: String,
        file_name: String,
    },

    #[error("Emitter failed for {type_name}: {reason}")]
    Emit { type_name: String, reason: String },
}

/// A row that does not fit the value type it is mapped into.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("Row has no column {column}")]
    MissingColumn { column: String },

    #[error("Column {column} is null but not nullable")]
    UnexpectedNull { column: String },

    #[error("Column {column} expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Row key {found} does not match requested key {expected}")]
    KeyMismatch { expected: Key, found: Key },

    #[error("Value type {type_name} has no field {field}")]
    UnknownField { type_name: String, field: String },
}

/// Data source failures.
///
/// These are shared by every waiter of a single fetch, so they must be
/// cheaply cloneable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Data source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Data source timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Data source error: {reason}")]
    Backend { reason: String },

    #[error("Malformed row in {table}: {error}")]
    MalformedRow { table: String, error: RowError },
}

/// Run-time lookup errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("No row in {table} for key {key}")]
    NotFound { table: String, key: Key },

    #[error("Key {key} does not fit primary key type {expected} of {table}")]
    KeyTypeMismatch {
        table: String,
        expected: ColumnType,
        key: Key,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

impl LookupError {
    /// True for the expected "no such row" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Configuration and manifest errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing manifest path (usage: rowcast-gen <manifest.toml> [--out-dir DIR])")]
    MissingManifestPath,

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse manifest TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Table class {class_name} is registered twice")]
    DuplicateTable { class_name: String },
}

/// Master error type for all ROWCAST errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowcastError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<SourceError> for RowcastError {
    fn from(err: SourceError) -> Self {
        Self::Lookup(LookupError::Source(err))
    }
}

/// Result type alias for ROWCAST operations.
pub type RowcastResult<T> = Result<T, RowcastError>;

// =============================================================================
// TESTS
// =============================================================================
