//! Code emitters for generated value types.
//!
//! The generator only produces [`ValueTypeDescriptor`]s; turning them into
//! source text is the job of a [`CodeEmitter`]. Two emitters ship here:
//! [`RustEmitter`] writes a plain struct with a `FromRow` impl, and
//! [`JsonEmitter`] writes the descriptor itself for emitters that live
//! outside this workspace.

use crate::generator::sanitize_field_name;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use rowcast_core::ident::is_identifier;
use rowcast_core::{ColumnType, GeneratedField, GenerationError, ValueTypeDescriptor};

/// Materializes source text for a value type descriptor.
pub trait CodeEmitter: Send + Sync {
    /// File name (no directory) the emitted source is written to.
    fn file_name(&self, value_type: &ValueTypeDescriptor) -> String;

    /// Emit the source text for one value type.
    fn emit(&self, value_type: &ValueTypeDescriptor) -> Result<String, GenerationError>;

    /// Optional index file tying all emitted files together, as
    /// `(file_name, contents)`.
    fn index(&self, _value_types: &[&ValueTypeDescriptor]) -> Option<(String, String)> {
        None
    }
}

fn module_name(value_type: &ValueTypeDescriptor) -> String {
    sanitize_field_name(value_type.name()).unwrap_or_else(|| value_type.name().to_lowercase())
}

// ============================================================================
// RUST EMITTER
// ============================================================================

/// Emits one Rust module per value type.
///
/// Sources are built as token streams and rendered with `prettyplease`, so
/// names and literals from table metadata can never leak out of the
/// positions they are interpolated into.
#[derive(Debug, Clone, Default)]
pub struct RustEmitter;

impl RustEmitter {
    pub fn new() -> Self {
        Self
    }
}

/// Rust type of a field, before nullability and type overrides are applied.
pub fn rust_type(column_type: &ColumnType) -> &'static str {
    match column_type {
        ColumnType::Short => "i16",
        ColumnType::Integer => "i32",
        ColumnType::Long => "i64",
        ColumnType::Float => "f32",
        ColumnType::Double => "f64",
        ColumnType::Decimal { .. } => "String",
        ColumnType::Char => "char",
        ColumnType::Bool => "bool",
        ColumnType::Text | ColumnType::Varchar { .. } | ColumnType::Enumeration { .. } => "String",
        ColumnType::Date => "::chrono::NaiveDate",
        ColumnType::DateTime | ColumnType::Timestamp => "::chrono::DateTime<::chrono::Utc>",
        ColumnType::Blob => "Vec<u8>",
        ColumnType::Uuid => "::uuid::Uuid",
    }
}

fn emit_error(value_type: &ValueTypeDescriptor, reason: impl Into<String>) -> GenerationError {
    GenerationError::Emit {
        type_name: value_type.name().to_string(),
        reason: reason.into(),
    }
}

fn parse_type(value_type: &ValueTypeDescriptor, path: &str) -> Result<syn::Type, GenerationError> {
    syn::parse_str(path).map_err(|e| {
        emit_error(value_type, format!("'{}' is not a Rust type: {}", path.escape_default(), e))
    })
}

/// Escape control characters so doc text stays on its line.
fn doc_text(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_control() {
                c.escape_default().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

fn field_doc(field: &GeneratedField) -> String {
    let mut notes = vec![field.column_type.to_string()];
    if field.is_key {
        notes.push("primary key".to_string());
    }
    if field.auto_increment {
        notes.push("auto increment".to_string());
    }
    if field.nullable {
        notes.push("nullable".to_string());
    }
    if let Some(default) = &field.default {
        notes.push(format!("default `{}`", default));
    }
    doc_text(&format!(" Column `{}` ({}).", field.column, notes.join(", ")))
}

fn field_type(
    value_type: &ValueTypeDescriptor,
    field: &GeneratedField,
) -> Result<TokenStream, GenerationError> {
    let ty = parse_type(
        value_type,
        field.typed.as_deref().unwrap_or(rust_type(&field.column_type)),
    )?;
    Ok(if field.nullable {
        quote!(Option<#ty>)
    } else {
        quote!(#ty)
    })
}

/// `field: <expr>` initializer of the emitted `FromRow` impl.
fn field_init(
    value_type: &ValueTypeDescriptor,
    field: &GeneratedField,
) -> Result<TokenStream, GenerationError> {
    let ident = format_ident!("{}", field.name);
    let name = field.name.as_str();
    let checked = quote!(value_type.require_field(#name)?);

    let init = match &field.typed {
        None => quote!(row.checked_column(#checked)?),
        Some(typed) => {
            let typed = parse_type(value_type, typed)?;
            let native = parse_type(value_type, rust_type(&field.column_type))?;
            let convert = quote!(<#typed as ::core::convert::From<#native>>::from);
            if field.nullable {
                quote!(row.checked_column::<Option<#native>>(#checked)?.map(#convert))
            } else {
                quote!(#convert(row.checked_column::<#native>(#checked)?))
            }
        }
    };
    Ok(quote!(#ident: #init))
}

fn render(tokens: TokenStream) -> Result<String, syn::Error> {
    let file: syn::File = syn::parse2(tokens)?;
    Ok(prettyplease::unparse(&file))
}

impl CodeEmitter for RustEmitter {
    fn file_name(&self, value_type: &ValueTypeDescriptor) -> String {
        format!("{}.rs", module_name(value_type))
    }

    fn emit(&self, value_type: &ValueTypeDescriptor) -> Result<String, GenerationError> {
        if let Some(bad) = value_type.fields().iter().find(|f| !is_identifier(&f.name)) {
            return Err(emit_error(
                value_type,
                format!("field name '{}' is not a Rust identifier", bad.name.escape_default()),
            ));
        }

        let ident = format_ident!("{}", value_type.name());
        let table_name = value_type.table_name();
        let key = value_type.key_field();
        let key_ident = format_ident!("{}", key.name);

        let header = doc_text(&format!(
            " Generated by rowcast-gen from table `{}` (class `{}`). Do not edit.",
            table_name,
            value_type.source_class()
        ));
        let struct_doc = doc_text(&format!(
            " One row of table `{}`, keyed by `{}`.",
            table_name, key.name
        ));
        let key_value = match key.column_type {
            ColumnType::Text | ColumnType::Varchar { .. } => quote!(self.#key_ident.clone()),
            _ => quote!(self.#key_ident),
        };

        let mut field_defs = Vec::with_capacity(value_type.fields().len());
        let mut field_inits = Vec::with_capacity(value_type.fields().len());
        for field in value_type.fields() {
            let doc = field_doc(field);
            let name = format_ident!("{}", field.name);
            let ty = field_type(value_type, field)?;
            field_defs.push(quote! {
                #[doc = #doc]
                pub #name: #ty
            });
            field_inits.push(field_init(value_type, field)?);
        }

        let tokens = quote! {
            #![doc = #header]

            #[doc = #struct_doc]
            #[derive(Debug, Clone, PartialEq)]
            pub struct #ident {
                #(#field_defs,)*
            }

            impl #ident {
                /// Table the value type was generated from.
                pub const TABLE: &str = #table_name;

                /// Primary key of this value.
                pub fn key(&self) -> ::rowcast_core::Key {
                    ::rowcast_core::Key::from(#key_value)
                }
            }

            impl ::rowcast_core::FromRow for #ident {
                fn from_row(
                    value_type: &::rowcast_core::ValueTypeDescriptor,
                    row: &::rowcast_core::Row,
                ) -> Result<Self, ::rowcast_core::RowError> {
                    Ok(Self {
                        #(#field_inits,)*
                    })
                }
            }
        };

        render(tokens).map_err(|e| emit_error(value_type, e.to_string()))
    }

    fn index(&self, value_types: &[&ValueTypeDescriptor]) -> Option<(String, String)> {
        if value_types.is_empty() {
            return None;
        }

        let modules: Vec<_> = value_types
            .iter()
            .map(|vt| format_ident!("{}", module_name(vt)))
            .collect();
        let types = value_types.iter().map(|vt| format_ident!("{}", vt.name()));

        let tokens = quote! {
            #![doc = " Generated by rowcast-gen. Do not edit."]

            #(pub mod #modules;)*

            #(pub use #modules::#types;)*
        };

        match render(tokens) {
            Ok(source) => Some(("mod.rs".to_string(), source)),
            Err(error) => {
                tracing::error!(error = %error, "Failed to render module index");
                None
            }
        }
    }
}

// ============================================================================
// JSON EMITTER
// ============================================================================

/// Emits the descriptor as pretty JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonEmitter;

impl CodeEmitter for JsonEmitter {
    fn file_name(&self, value_type: &ValueTypeDescriptor) -> String {
        format!("{}.json", module_name(value_type))
    }

    fn emit(&self, value_type: &ValueTypeDescriptor) -> Result<String, GenerationError> {
        serde_json::to_string_pretty(value_type).map_err(|e| GenerationError::Emit {
            type_name: value_type.name().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use quote::ToTokens;
    use rowcast_core::{describe, ColumnMetadata, TableClassMetadata};

    fn users_value() -> ValueTypeDescriptor {
        let meta = TableClassMetadata::new("Users")
            .with_column(
                ColumnMetadata::new("id", ColumnType::Varchar { length: 10 }).primary_key(),
            )
            .with_column(ColumnMetadata::new("name", ColumnType::Varchar { length: 50 }))
            .with_column(ColumnMetadata::new("cityId", ColumnType::Integer).nullable());
        generate(&describe(&meta).unwrap()).unwrap()
    }

    fn image_with(column: ColumnMetadata) -> ValueTypeDescriptor {
        let meta = TableClassMetadata::new("Image")
            .with_column(ColumnMetadata::new("id", ColumnType::Integer).primary_key())
            .with_column(column);
        generate(&describe(&meta).unwrap()).unwrap()
    }

    /// `(name, type)` of every field of the emitted struct, types without spaces.
    fn struct_fields(file: &syn::File) -> Vec<(String, String)> {
        let item = file
            .items
            .iter()
            .find_map(|item| match item {
                syn::Item::Struct(item) => Some(item),
                _ => None,
            })
            .expect("emitted file has a struct");
        item.fields
            .iter()
            .map(|f| {
                let name = f.ident.as_ref().unwrap().to_string();
                let ty = f.ty.to_token_stream().to_string().replace(' ', "");
                (name, ty)
            })
            .collect()
    }

    fn compact(source: &str) -> String {
        source.split_whitespace().collect()
    }

    #[test]
    fn test_rust_type_mapping() {
        assert_eq!(rust_type(&ColumnType::Integer), "i32");
        assert_eq!(rust_type(&ColumnType::Long), "i64");
        assert_eq!(rust_type(&ColumnType::Varchar { length: 3 }), "String");
        assert_eq!(rust_type(&ColumnType::Blob), "Vec<u8>");
        assert_eq!(rust_type(&ColumnType::Uuid), "::uuid::Uuid");
    }

    #[test]
    fn test_rust_emitter_struct() {
        let vt = users_value();
        let source = RustEmitter::new().emit(&vt).unwrap();
        let file = syn::parse_file(&source).unwrap();

        assert_eq!(
            struct_fields(&file),
            vec![
                ("id".to_string(), "String".to_string()),
                ("name".to_string(), "String".to_string()),
                ("city_id".to_string(), "Option<i32>".to_string()),
            ]
        );
        assert_eq!(file.items.len(), 3);
        assert!(source.contains("pub struct UsersValue {"));
        assert!(source.contains("impl ::rowcast_core::FromRow for UsersValue {"));
        assert!(source.contains("pub const TABLE: &str = \"Users\";"));
        assert!(source.contains("/// Column `id` (VARCHAR(10), primary key)."));
        let compact = compact(&source);
        assert!(compact.contains("city_id:row.checked_column(value_type.require_field(\"city_id\")?)?"));
        assert!(compact.contains("::rowcast_core::Key::from(self.id.clone())"));
    }

    #[test]
    fn test_rust_emitter_copies_integral_keys() {
        let source = RustEmitter::new()
            .emit(&image_with(ColumnMetadata::new("path", ColumnType::Text)))
            .unwrap();
        assert!(compact(&source).contains("::rowcast_core::Key::from(self.id)"));
    }

    #[test]
    fn test_multi_line_default_stays_in_doc_comment() {
        let default = "'/x'\npub fn injected() {}";
        let vt = image_with(ColumnMetadata::new("path", ColumnType::Text).with_default(default));
        let source = RustEmitter::new().emit(&vt).unwrap();
        let file = syn::parse_file(&source).unwrap();

        // struct, inherent impl, FromRow impl
        assert_eq!(file.items.len(), 3);
        assert_eq!(struct_fields(&file).len(), 2);
        assert!(source
            .lines()
            .all(|line| !line.trim_start().starts_with("pub fn injected")));
        let doc = r"/// Column `path` (TEXT, default `'/x'\npub fn injected() {}`).";
        assert!(source.contains(doc));
    }

    #[test]
    fn test_table_name_is_escaped() {
        let meta = TableClassMetadata::new("Image")
            .with_table_name("images\"; pub fn injected() {} //")
            .with_column(ColumnMetadata::new("id", ColumnType::Integer).primary_key());
        let vt = generate(&describe(&meta).unwrap()).unwrap();
        let source = RustEmitter::new().emit(&vt).unwrap();

        let file = syn::parse_file(&source).unwrap();
        assert_eq!(file.items.len(), 3);
        assert!(!source.contains("\npub fn injected"));
    }

    #[test]
    fn test_typed_override_changes_field_type() {
        let meta = TableClassMetadata::new("Image")
            .with_column(ColumnMetadata::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnMetadata::new("path", ColumnType::Text).typed("crate::ImagePath"))
            .with_column(
                ColumnMetadata::new("thumb", ColumnType::Text)
                    .nullable()
                    .typed("::std::path::PathBuf"),
            );
        let vt = generate(&describe(&meta).unwrap()).unwrap();
        let source = RustEmitter::new().emit(&vt).unwrap();
        let file = syn::parse_file(&source).unwrap();

        assert_eq!(
            struct_fields(&file),
            vec![
                ("id".to_string(), "i32".to_string()),
                ("path".to_string(), "crate::ImagePath".to_string()),
                ("thumb".to_string(), "Option<::std::path::PathBuf>".to_string()),
            ]
        );
        let compact = compact(&source);
        assert!(compact.contains(
            "<crate::ImagePathas::core::convert::From<String>>::from(row.checked_column::<String>("
        ));
        assert!(compact.contains("checked_column::<Option<String>>(value_type.require_field(\"thumb\")?)?"));
        assert!(compact.contains(".map(<::std::path::PathBufas::core::convert::From<String>>::from)"));
    }

    #[test]
    fn test_rust_emitter_rejects_unparsable_typed_override() {
        let mut vt = serde_json::to_value(image_with(ColumnMetadata::new("path", ColumnType::Text)))
            .unwrap();
        vt["fields"][1]["typed"] = serde_json::json!("Vec<");
        let vt: ValueTypeDescriptor = serde_json::from_value(vt).unwrap();

        assert!(matches!(
            RustEmitter::new().emit(&vt),
            Err(GenerationError::Emit { .. })
        ));
    }

    #[test]
    fn test_rust_emitter_file_and_index_names() {
        let vt = users_value();
        let emitter = RustEmitter::new();
        assert_eq!(emitter.file_name(&vt), "users_value.rs");

        let (file, index) = emitter.index(&[&vt]).unwrap();
        assert_eq!(file, "mod.rs");
        assert!(index.contains("pub mod users_value;"));
        assert!(index.contains("pub use users_value::UsersValue;"));
        assert!(syn::parse_file(&index).is_ok());

        assert!(emitter.index(&[]).is_none());
    }

    #[test]
    fn test_rust_emitter_rejects_foreign_field_names() {
        let vt: ValueTypeDescriptor = serde_json::from_value(serde_json::json!({
            "name": "Broken",
            "table_name": "broken",
            "source_class": "Broken",
            "fields": [{
                "name": "not an ident",
                "column": "x",
                "column_type": {"kind": "integer"},
                "nullable": false,
                "is_key": true,
                "auto_increment": false,
                "default": null
            }],
            "key_index": 0
        }))
        .unwrap();

        assert!(matches!(
            RustEmitter::new().emit(&vt),
            Err(GenerationError::Emit { .. })
        ));
    }

    #[test]
    fn test_json_emitter_round_trips_descriptor() {
        let vt = users_value();
        let emitter = JsonEmitter;
        assert_eq!(emitter.file_name(&vt), "users_value.json");

        let json = emitter.emit(&vt).unwrap();
        let back: ValueTypeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vt);
    }
}
