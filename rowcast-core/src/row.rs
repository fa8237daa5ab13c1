//! Rows retrieved from a data source

use crate::{FromValue, GeneratedField, Key, RowError, TableDescriptor, Value};
use serde::{Deserialize, Serialize};

/// A concrete record of a lookup table: ordered `(column, value)` cells.
///
/// Rows are built once by the data source and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell setter. Setting a column twice replaces the value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column, value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Read a column as a typed value, without column type checks.
    pub fn column<T: FromValue>(&self, column: &str) -> Result<T, RowError> {
        let value = self.get(column).ok_or_else(|| RowError::MissingColumn {
            column: column.to_string(),
        })?;

        T::from_value(value).ok_or_else(|| {
            if value.is_null() {
                RowError::UnexpectedNull {
                    column: column.to_string(),
                }
            } else {
                RowError::TypeMismatch {
                    column: column.to_string(),
                    expected: std::any::type_name::<T>().to_string(),
                    found: value.kind().to_string(),
                }
            }
        })
    }

    /// The cell backing a generated field, checked against the field's
    /// column type and nullability.
    pub fn checked_value(&self, field: &GeneratedField) -> Result<&Value, RowError> {
        let value = self.get(&field.column).ok_or_else(|| RowError::MissingColumn {
            column: field.column.clone(),
        })?;

        if value.is_null() {
            if !field.nullable {
                return Err(RowError::UnexpectedNull {
                    column: field.column.clone(),
                });
            }
        } else if !field.column_type.accepts(value) {
            return Err(RowError::TypeMismatch {
                column: field.column.clone(),
                expected: field.column_type.to_string(),
                found: value.kind().to_string(),
            });
        }

        Ok(value)
    }

    /// Read a generated field as a typed value.
    ///
    /// This is what emitted `FromRow` implementations call: the cell must fit
    /// the field's column type (Varchar length, Enumeration variants) before
    /// it is converted.
    pub fn checked_column<T: FromValue>(&self, field: &GeneratedField) -> Result<T, RowError> {
        self.checked_value(field)?;
        self.column(&field.column)
    }

    /// The primary-key value of this row, normalized to the table's key type.
    pub fn key(&self, table: &TableDescriptor) -> Result<Key, RowError> {
        let pk = table.primary_key();
        let value = self.get(&pk.name).ok_or_else(|| RowError::MissingColumn {
            column: pk.name.clone(),
        })?;

        if value.is_null() {
            return Err(RowError::UnexpectedNull {
                column: pk.name.clone(),
            });
        }

        Key::from_value(value)
            .and_then(|key| key.coerce_to(&pk.column_type))
            .ok_or_else(|| RowError::TypeMismatch {
                column: pk.name.clone(),
                expected: pk.column_type.to_string(),
                found: value.kind().to_string(),
            })
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<C: Into<String>, V: Into<Value>> FromIterator<(C, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Row::new(), |row, (column, value)| row.with(column, value))
    }
}
