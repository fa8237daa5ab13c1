//! Table descriptors: the validated schema of a lookup table.
//!
//! Table classes are registered explicitly as [`TableClassMetadata`] (there
//! is no reflection). [`describe`] turns that metadata into an immutable
//! [`TableDescriptor`], which both the generator and the cache runtime read.

use crate::ident::{is_identifier, is_type_path};
use crate::{ColumnDescriptor, ColumnMetadata, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Suffix appended to the source class name when no value name is given.
pub const VALUE_SUFFIX: &str = "Value";

/// Suffix stripped from the class name to derive a default table name.
pub const TABLE_SUFFIX: &str = "Table";

/// Marks a table class for value type generation.
///
/// An empty `name` means "derive the default name" (`<Class>Value`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueAnnotation {
    #[serde(default)]
    pub name: String,
}

impl ValueAnnotation {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Registration-time description of a table class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableClassMetadata {
    pub class_name: String,
    #[serde(default)]
    pub table_name: Option<String>,
    /// Whether the class provides the lookup table capability. Only lookup
    /// tables can carry a value annotation.
    #[serde(default = "default_lookup_table")]
    pub lookup_table: bool,
    #[serde(default)]
    pub value: ValueAnnotation,
    pub columns: Vec<ColumnMetadata>,
}

fn default_lookup_table() -> bool {
    true
}

impl TableClassMetadata {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            table_name: None,
            lookup_table: true,
            value: ValueAnnotation::default(),
            columns: Vec::new(),
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_value_name(mut self, name: impl Into<String>) -> Self {
        self.value = ValueAnnotation::named(name);
        self
    }

    pub fn with_column(mut self, column: ColumnMetadata) -> Self {
        self.columns.push(column);
        self
    }
}

/// Validated, immutable schema of a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    table_name: String,
    source_class: String,
    annotation: ValueAnnotation,
    columns: Vec<ColumnDescriptor>,
    primary_key_index: usize,
}

impl TableDescriptor {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn source_class(&self) -> &str {
        &self.source_class
    }

    pub fn annotation(&self) -> &ValueAnnotation {
        &self.annotation
    }

    /// All columns in declaration order, primary key included.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn primary_key(&self) -> &ColumnDescriptor {
        &self.columns[self.primary_key_index]
    }

    /// Position of the primary key within [`Self::columns`].
    pub fn primary_key_index(&self) -> usize {
        self.primary_key_index
    }

    /// The non-key columns, in declaration order.
    pub fn other_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.primary_key_index)
            .map(|(_, column)| column)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Capability of a lookup table: anything that can report its descriptor and
/// primary key qualifies, regardless of how it is implemented.
pub trait LookupTable: Send + Sync {
    fn descriptor(&self) -> &TableDescriptor;

    fn primary_key(&self) -> &ColumnDescriptor {
        self.descriptor().primary_key()
    }
}

/// Resolve the generated value type name.
///
/// Returns the annotation name when non-empty, else `source_class_name + "Value"`.
pub fn resolve_value_type_name(annotation_name: &str, source_class_name: &str) -> String {
    if annotation_name.is_empty() {
        format!("{}{}", source_class_name, VALUE_SUFFIX)
    } else {
        annotation_name.to_string()
    }
}

/// Default table name for a class: the class name minus a trailing `Table`.
pub fn default_table_name(class_name: &str) -> String {
    match class_name.strip_suffix(TABLE_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => class_name.to_string(),
    }
}

/// Validate table class metadata into a [`TableDescriptor`].
pub fn describe(meta: &TableClassMetadata) -> Result<TableDescriptor, SchemaError> {
    if !meta.lookup_table {
        return Err(SchemaError::NotALookupTable {
            class_name: meta.class_name.clone(),
        });
    }

    if !is_identifier(&meta.class_name) {
        return Err(SchemaError::InvalidClassName {
            class_name: meta.class_name.clone(),
        });
    }

    let table_name = match meta.table_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default_table_name(&meta.class_name),
    };

    if meta.columns.is_empty() {
        return Err(SchemaError::NoColumns { table: table_name });
    }

    let mut seen = HashSet::new();
    for column in &meta.columns {
        if column.name.trim().is_empty() {
            return Err(SchemaError::EmptyColumnName { table: table_name });
        }
        if !seen.insert(column.name.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                table: table_name,
                column: column.name.clone(),
            });
        }
        if column.auto_increment && !column.column_type.is_integral() {
            return Err(SchemaError::InvalidAutoIncrement {
                table: table_name,
                column: column.name.clone(),
            });
        }
        if let Some(typed) = &column.typed {
            let reason = if column.primary_key {
                Some("the primary key keeps its native type".to_string())
            } else if !is_type_path(typed) {
                Some(format!("'{}' is not a Rust type path", typed.escape_default()))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(SchemaError::InvalidTypedColumn {
                    table: table_name,
                    column: column.name.clone(),
                    reason,
                });
            }
        }
    }

    let keys: Vec<usize> = meta
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary_key)
        .map(|(i, _)| i)
        .collect();

    let primary_key_index = match keys.as_slice() {
        [] => return Err(SchemaError::MissingPrimaryKey { table: table_name }),
        [index] => *index,
        _ => {
            return Err(SchemaError::MultiplePrimaryKeys {
                table: table_name,
                columns: keys.iter().map(|i| meta.columns[*i].name.clone()).collect(),
            })
        }
    };

    let pk = &meta.columns[primary_key_index];
    if pk.nullable {
        return Err(SchemaError::NullablePrimaryKey {
            table: table_name,
            column: pk.name.clone(),
        });
    }
    if !pk.column_type.is_key_type() {
        return Err(SchemaError::UnsupportedKeyType {
            table: table_name,
            column: pk.name.clone(),
            column_type: pk.column_type.clone(),
        });
    }

    Ok(TableDescriptor {
        table_name,
        source_class: meta.class_name.clone(),
        annotation: meta.value.clone(),
        columns: meta.columns.iter().map(ColumnDescriptor::from).collect(),
        primary_key_index,
    })
}
