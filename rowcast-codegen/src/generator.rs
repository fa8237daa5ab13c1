//! Value Type Generator - TableDescriptor to ValueTypeDescriptor
//!
//! Maps every table column to a generated field, in declaration order, and
//! marks the primary-key column as the identity of the generated type.

use convert_case::{Case, Casing};
use rowcast_core::ident::{is_identifier, is_keyword};
use rowcast_core::{
    resolve_value_type_name, GeneratedField, GenerationError, TableDescriptor,
    ValueTypeDescriptor,
};
use std::collections::HashMap;

/// Turn a column name into a snake_case field name.
///
/// The case split (camelCase, acronyms, `-`, spaces) is `convert_case`'s
/// snake case. Whatever is still not ASCII alphanumeric becomes `_`, runs of
/// `_` collapse and are trimmed. A leading digit gets a `_` prefix and
/// keywords get a `_` suffix. Returns `None` if nothing usable is left.
pub fn sanitize_field_name(raw: &str) -> Option<String> {
    let snake = raw.to_case(Case::Snake);
    let replaced: String = snake
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    let collapsed = replaced
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if collapsed.is_empty() {
        return None;
    }

    let mut name = if collapsed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", collapsed)
    } else {
        collapsed
    };

    if is_keyword(&name) {
        name.push('_');
    }

    Some(name)
}

/// Generate the value type descriptor for a table.
pub fn generate(table: &TableDescriptor) -> Result<ValueTypeDescriptor, GenerationError> {
    let type_name = resolve_value_type_name(&table.annotation().name, table.source_class());
    if !is_identifier(&type_name) {
        return Err(GenerationError::InvalidTypeName { name: type_name });
    }

    let mut owners: HashMap<String, &str> = HashMap::new();
    let mut fields = Vec::with_capacity(table.columns().len());

    for (index, column) in table.columns().iter().enumerate() {
        let name = sanitize_field_name(&column.name).ok_or_else(|| {
            GenerationError::InvalidFieldName {
                type_name: type_name.clone(),
                column: column.name.clone(),
            }
        })?;

        if let Some(first) = owners.insert(name.clone(), column.name.as_str()) {
            return Err(GenerationError::FieldNameCollision {
                type_name,
                field: name,
                first_column: first.to_string(),
                second_column: column.name.clone(),
            });
        }

        fields.push(GeneratedField {
            name,
            column: column.name.clone(),
            column_type: column.column_type.clone(),
            nullable: column.nullable,
            is_key: index == table.primary_key_index(),
            auto_increment: column.auto_increment,
            default: column.default.clone(),
            typed: column.typed.clone(),
        });
    }

    ValueTypeDescriptor::new(type_name, table.table_name(), table.source_class(), fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcast_core::{describe, ColumnMetadata, ColumnType, TableClassMetadata};

    fn image() -> TableClassMetadata {
        TableClassMetadata::new("Image")
            .with_column(ColumnMetadata::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnMetadata::new("path", ColumnType::Text))
    }

    #[test]
    fn test_sanitize_field_name() {
        assert_eq!(sanitize_field_name("path").as_deref(), Some("path"));
        assert_eq!(sanitize_field_name("image_url").as_deref(), Some("image_url"));
        assert_eq!(sanitize_field_name("cityId").as_deref(), Some("city_id"));
        assert_eq!(sanitize_field_name("Image-URL").as_deref(), Some("image_url"));
        assert_eq!(sanitize_field_name("  created at ").as_deref(), Some("created_at"));
        assert_eq!(sanitize_field_name("type").as_deref(), Some("type_"));
        assert_eq!(sanitize_field_name("path!x").as_deref(), Some("path_x"));
        assert_eq!(sanitize_field_name("__"), None);
        assert_eq!(sanitize_field_name("äö"), None);
    }

    #[test]
    fn test_sanitize_field_name_splits_acronyms() {
        assert_eq!(sanitize_field_name("URLPath").as_deref(), Some("url_path"));
        assert_eq!(sanitize_field_name("imageURL").as_deref(), Some("image_url"));
        assert_eq!(sanitize_field_name("HTTPStatusCode").as_deref(), Some("http_status_code"));
    }

    #[test]
    fn test_sanitize_field_name_leading_digit() {
        let name = sanitize_field_name("2fa").unwrap();
        assert!(name.starts_with('_'));
        assert!(is_identifier(&name));
    }

    #[test]
    fn test_generate_image_value() {
        let table = describe(&image()).unwrap();
        let vt = generate(&table).unwrap();

        assert_eq!(vt.name(), "ImageValue");
        assert_eq!(vt.table_name(), "Image");
        let names: Vec<&str> = vt.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "path"]);
        assert_eq!(vt.key_field().name, "id");
        assert_eq!(vt.key_field().column_type, ColumnType::Integer);
        assert!(!vt.fields()[1].is_key);
    }

    #[test]
    fn test_generate_uses_explicit_name() {
        let table = describe(&image().with_value_name("Picture")).unwrap();
        let vt = generate(&table).unwrap();
        assert_eq!(vt.name(), "Picture");
    }

    #[test]
    fn test_generate_rejects_invalid_explicit_name() {
        let table = describe(&image().with_value_name("Picture Frame")).unwrap();
        assert_eq!(
            generate(&table),
            Err(GenerationError::InvalidTypeName {
                name: "Picture Frame".to_string()
            })
        );
    }

    #[test]
    fn test_generate_detects_collision() {
        let meta = image()
            .with_column(ColumnMetadata::new("image_url", ColumnType::Text))
            .with_column(ColumnMetadata::new("Image-URL", ColumnType::Text));
        let table = describe(&meta).unwrap();

        match generate(&table) {
            Err(GenerationError::FieldNameCollision {
                field,
                first_column,
                second_column,
                ..
            }) => {
                assert_eq!(field, "image_url");
                assert_eq!(first_column, "image_url");
                assert_eq!(second_column, "Image-URL");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_rejects_unusable_column_name() {
        let meta = image().with_column(ColumnMetadata::new("--", ColumnType::Text));
        let table = describe(&meta).unwrap();
        assert!(matches!(
            generate(&table),
            Err(GenerationError::InvalidFieldName { .. })
        ));
    }

    #[test]
    fn test_generate_carries_column_attributes() {
        let meta = TableClassMetadata::new("Cities")
            .with_column(
                ColumnMetadata::new("id", ColumnType::Integer)
                    .primary_key()
                    .auto_increment(),
            )
            .with_column(ColumnMetadata::new("name", ColumnType::Varchar { length: 50 }))
            .with_column(
                ColumnMetadata::new("population", ColumnType::Long)
                    .nullable()
                    .with_default("0"),
            );
        let vt = generate(&describe(&meta).unwrap()).unwrap();

        assert_eq!(vt.name(), "CitiesValue");
        assert!(vt.key_field().auto_increment);
        let population = vt.field("population").unwrap();
        assert!(population.nullable);
        assert_eq!(population.default.as_deref(), Some("0"));
        assert_eq!(population.typed, None);
    }

    #[test]
    fn test_generate_carries_typed_override() {
        let thumb = ColumnMetadata::new("thumb", ColumnType::Text).typed("crate::Thumb");
        let meta = image().with_column(thumb);
        let vt = generate(&describe(&meta).unwrap()).unwrap();
        assert_eq!(vt.field("thumb").unwrap().typed.as_deref(), Some("crate::Thumb"));
        assert_eq!(vt.key_field().typed, None);
    }
}
