//! Generated value types and row-to-value mapping

use crate::ident::is_identifier;
use crate::{ColumnType, GenerationError, Key, Row, RowError, Value};
use serde::{Deserialize, Serialize};

/// One field of a generated value type, mirroring one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedField {
    /// Sanitized field name in the generated type.
    pub name: String,
    /// Source column the field is read from.
    pub column: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub is_key: bool,
    pub auto_increment: bool,
    pub default: Option<String>,
    /// Type path overriding the native field type.
    #[serde(default)]
    pub typed: Option<String>,
}

/// Descriptor of a generated, immutable value type.
///
/// Handed to a code emitter at build time and used by the cache runtime as
/// the field mapping for rows. Deserialization goes through
/// [`ValueTypeDescriptor::new`], so descriptors read back from JSON hold the
/// same invariants as generated ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawValueTypeDescriptor")]
pub struct ValueTypeDescriptor {
    name: String,
    table_name: String,
    source_class: String,
    fields: Vec<GeneratedField>,
    key_index: usize,
}

/// Wire shape of [`ValueTypeDescriptor`], before validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawValueTypeDescriptor {
    name: String,
    table_name: String,
    source_class: String,
    fields: Vec<GeneratedField>,
    key_index: usize,
}

impl TryFrom<RawValueTypeDescriptor> for ValueTypeDescriptor {
    type Error = GenerationError;

    fn try_from(raw: RawValueTypeDescriptor) -> Result<Self, Self::Error> {
        let descriptor = Self::new(raw.name, raw.table_name, raw.source_class, raw.fields)?;
        if descriptor.key_index != raw.key_index {
            return Err(GenerationError::KeyIndexMismatch {
                type_name: descriptor.name,
                key_index: raw.key_index,
            });
        }
        Ok(descriptor)
    }
}

impl ValueTypeDescriptor {
    /// Assemble a descriptor, checking its invariants: a valid type name and
    /// exactly one key field.
    pub fn new(
        name: impl Into<String>,
        table_name: impl Into<String>,
        source_class: impl Into<String>,
        fields: Vec<GeneratedField>,
    ) -> Result<Self, GenerationError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(GenerationError::InvalidTypeName { name });
        }

        let mut keys = fields.iter().enumerate().filter(|(_, f)| f.is_key);
        let key_index = match (keys.next(), keys.next()) {
            (Some((index, _)), None) => index,
            _ => return Err(GenerationError::MissingKeyField { type_name: name }),
        };

        Ok(Self {
            name,
            table_name: table_name.into(),
            source_class: source_class.into(),
            fields,
            key_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn source_class(&self) -> &str {
        &self.source_class
    }

    pub fn fields(&self) -> &[GeneratedField] {
        &self.fields
    }

    /// The field that carries the primary key, the identity of the value.
    pub fn key_field(&self) -> &GeneratedField {
        &self.fields[self.key_index]
    }

    pub fn field(&self, name: &str) -> Option<&GeneratedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Like [`Self::field`], for row mapping code that needs a field to exist.
    pub fn require_field(&self, name: &str) -> Result<&GeneratedField, RowError> {
        self.field(name).ok_or_else(|| RowError::UnknownField {
            type_name: self.name.clone(),
            field: name.to_string(),
        })
    }
}

/// Construction of a value instance from a fetched row.
///
/// Implemented by [`ValueInstance`] and by emitted value structs.
pub trait FromRow: Sized + Send + Sync + 'static {
    fn from_row(value_type: &ValueTypeDescriptor, row: &Row) -> Result<Self, RowError>;
}

/// Dynamically typed value instance: the generated field mapping applied to
/// a row, without compiling the emitted struct.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInstance {
    type_name: String,
    key: Key,
    fields: Vec<(String, Value)>,
}

impl ValueInstance {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromRow for ValueInstance {
    fn from_row(value_type: &ValueTypeDescriptor, row: &Row) -> Result<Self, RowError> {
        let mut fields = Vec::with_capacity(value_type.fields().len());
        let mut key = None;

        for field in value_type.fields() {
            let value = row.checked_value(field)?;
            if field.is_key {
                key = Key::from_value(value);
            }
            fields.push((field.name.clone(), value.clone()));
        }

        // accepts() on a key-capable type guarantees a key here
        let key = key.ok_or_else(|| RowError::MissingColumn {
            column: value_type.key_field().column.clone(),
        })?;

        Ok(Self {
            type_name: value_type.name().to_string(),
            key,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, column_type: ColumnType, is_key: bool) -> GeneratedField {
        GeneratedField {
            name: name.to_string(),
            column: name.to_string(),
            column_type,
            nullable: false,
            is_key,
            auto_increment: false,
            default: None,
            typed: None,
        }
    }

    fn image_value() -> ValueTypeDescriptor {
        ValueTypeDescriptor::new(
            "ImageValue",
            "Image",
            "Image",
            vec![
                field("id", ColumnType::Integer, true),
                field("path", ColumnType::Text, false),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_descriptor_requires_one_key_field() {
        let err = ValueTypeDescriptor::new("X", "x", "X", vec![field("a", ColumnType::Text, false)]);
        assert!(matches!(err, Err(GenerationError::MissingKeyField { .. })));

        let err = ValueTypeDescriptor::new(
            "X",
            "x",
            "X",
            vec![
                field("a", ColumnType::Integer, true),
                field("b", ColumnType::Integer, true),
            ],
        );
        assert!(matches!(err, Err(GenerationError::MissingKeyField { .. })));
    }

    #[test]
    fn test_descriptor_rejects_invalid_name() {
        let err = ValueTypeDescriptor::new("", "x", "X", vec![field("a", ColumnType::Integer, true)]);
        assert!(matches!(err, Err(GenerationError::InvalidTypeName { .. })));
    }

    #[test]
    fn test_descriptor_deserialization_is_validated() {
        let json = serde_json::to_value(image_value()).unwrap();
        let back: ValueTypeDescriptor = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, image_value());

        let mut out_of_range = json.clone();
        out_of_range["key_index"] = serde_json::json!(7);
        let err = serde_json::from_value::<ValueTypeDescriptor>(out_of_range).unwrap_err();
        assert!(err.to_string().contains("key index 7"));

        let mut no_key = json.clone();
        no_key["fields"][0]["is_key"] = serde_json::json!(false);
        assert!(serde_json::from_value::<ValueTypeDescriptor>(no_key).is_err());

        let mut bad_name = json;
        bad_name["name"] = serde_json::json!("Image Value");
        assert!(serde_json::from_value::<ValueTypeDescriptor>(bad_name).is_err());
    }

    #[test]
    fn test_require_field() {
        let vt = image_value();
        assert_eq!(vt.require_field("path").unwrap().column, "path");
        assert_eq!(
            vt.require_field("size"),
            Err(RowError::UnknownField {
                type_name: "ImageValue".to_string(),
                field: "size".to_string(),
            })
        );
    }

    #[test]
    fn test_value_instance_from_row() {
        let vt = image_value();
        let row = Row::new().with("id", 42).with("path", "/a.png");
        let value = ValueInstance::from_row(&vt, &row).unwrap();

        assert_eq!(value.type_name(), "ImageValue");
        assert_eq!(value.key(), &Key::Int(42));
        assert_eq!(value.get("path"), Some(&Value::Text("/a.png".to_string())));
        assert_eq!(value.fields().count(), 2);
    }

    #[test]
    fn test_value_instance_rejects_bad_rows() {
        let vt = image_value();

        let missing = Row::new().with("id", 42);
        assert!(matches!(
            ValueInstance::from_row(&vt, &missing),
            Err(RowError::MissingColumn { .. })
        ));

        let null = Row::new().with("id", 42).with("path", Value::Null);
        assert!(matches!(
            ValueInstance::from_row(&vt, &null),
            Err(RowError::UnexpectedNull { .. })
        ));

        let wrong = Row::new().with("id", "42").with("path", "/a.png");
        assert!(matches!(
            ValueInstance::from_row(&vt, &wrong),
            Err(RowError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_value_instance_ignores_extra_columns() {
        let vt = image_value();
        let row = Row::new()
            .with("id", 1)
            .with("path", "/b.png")
            .with("checksum", "abc");
        let value = ValueInstance::from_row(&vt, &row).unwrap();
        assert_eq!(value.get("checksum"), None);
    }
}
