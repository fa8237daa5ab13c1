//! Explicit table registration and batch generation.
//!
//! Table classes are registered by hand (there is no annotation scanning).
//! [`TableRegistry::generate_all`] runs describe → generate → emit for every
//! table; a failing table is reported and skipped, the others still generate.

use crate::emitter::CodeEmitter;
use crate::generator::generate;
use rowcast_core::{
    describe, ConfigError, GenerationError, RowcastError, RowcastResult, TableClassMetadata,
    TableDescriptor, ValueTypeDescriptor,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Output of a successful generation for one table.
#[derive(Debug, Clone)]
pub struct GeneratedTable {
    pub table: Arc<TableDescriptor>,
    pub value_type: Arc<ValueTypeDescriptor>,
    pub file_name: String,
    pub source: String,
}

/// A table whose generation was aborted.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFailure {
    pub class_name: String,
    pub error: RowcastError,
}

/// Result of generating every registered table.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub generated: Vec<GeneratedTable>,
    pub failures: Vec<TableFailure>,
    /// Index file from the emitter, if it produces one.
    pub index: Option<(String, String)>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Find a generated table by value type name.
    pub fn get(&self, type_name: &str) -> Option<&GeneratedTable> {
        self.generated
            .iter()
            .find(|g| g.value_type.name() == type_name)
    }
}

/// Describe, generate and emit a single table.
pub fn generate_table(
    meta: &TableClassMetadata,
    emitter: &dyn CodeEmitter,
) -> RowcastResult<GeneratedTable> {
    let table = describe(meta)?;
    let value_type = generate(&table)?;

    tracing::info!(
        class = %meta.class_name,
        table = %table.table_name(),
        fields = value_type.fields().len(),
        "Generating value type {}",
        value_type.name()
    );

    let source = emitter.emit(&value_type)?;
    let file_name = emitter.file_name(&value_type);

    Ok(GeneratedTable {
        table: Arc::new(table),
        value_type: Arc::new(value_type),
        file_name,
        source,
    })
}

/// Registered table classes, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: Vec<TableClassMetadata>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table class. Class names must be unique.
    pub fn register(&mut self, meta: TableClassMetadata) -> Result<(), ConfigError> {
        if self.tables.iter().any(|t| t.class_name == meta.class_name) {
            return Err(ConfigError::DuplicateTable {
                class_name: meta.class_name,
            });
        }
        self.tables.push(meta);
        Ok(())
    }

    pub fn tables(&self) -> &[TableClassMetadata] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Generate every registered table with `emitter`.
    pub fn generate_all(&self, emitter: &dyn CodeEmitter) -> GenerationReport {
        let mut report = GenerationReport::default();
        let mut type_owners: HashMap<String, String> = HashMap::new();
        // file name -> value type written there
        let mut file_owners: HashMap<String, String> = HashMap::new();

        for meta in &self.tables {
            let result = generate_table(meta, emitter).and_then(|generated| {
                let name = generated.value_type.name().to_string();
                if let Some(first_class) = type_owners.get(&name) {
                    return Err(RowcastError::from(GenerationError::DuplicateTypeName {
                        name,
                        first_class: first_class.clone(),
                    }));
                }
                if let Some(first_type) = file_owners.get(&generated.file_name) {
                    return Err(RowcastError::from(GenerationError::DuplicateFileName {
                        name,
                        first_type: first_type.clone(),
                        file_name: generated.file_name.clone(),
                    }));
                }
                type_owners.insert(name.clone(), meta.class_name.clone());
                file_owners.insert(generated.file_name.clone(), name);
                Ok(generated)
            });

            match result {
                Ok(generated) => report.generated.push(generated),
                Err(error) => {
                    tracing::error!(
                        class = %meta.class_name,
                        error = %error,
                        "Value type generation failed"
                    );
                    report.failures.push(TableFailure {
                        class_name: meta.class_name.clone(),
                        error,
                    });
                }
            }
        }

        let value_types: Vec<&ValueTypeDescriptor> = report
            .generated
            .iter()
            .map(|g| g.value_type.as_ref())
            .collect();
        report.index = emitter.index(&value_types);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::RustEmitter;
    use rowcast_core::{ColumnMetadata, ColumnType, SchemaError};

    fn table(class: &str) -> TableClassMetadata {
        TableClassMetadata::new(class)
            .with_column(ColumnMetadata::new("id", ColumnType::Long).primary_key())
            .with_column(ColumnMetadata::new("name", ColumnType::Text))
    }

    #[test]
    fn test_register_rejects_duplicate_class() {
        let mut registry = TableRegistry::new();
        registry.register(table("Cities")).unwrap();
        let err = registry.register(table("Cities")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTable { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_generate_all_isolates_failures() {
        let mut registry = TableRegistry::new();
        registry.register(table("Cities")).unwrap();
        registry
            .register(TableClassMetadata::new("Broken").with_column(ColumnMetadata::new(
                "name",
                ColumnType::Text,
            )))
            .unwrap();
        registry.register(table("Countries")).unwrap();

        let report = registry.generate_all(&RustEmitter::new());

        assert!(!report.is_success());
        assert_eq!(report.generated.len(), 2);
        assert!(report.get("CitiesValue").is_some());
        assert!(report.get("CountriesValue").is_some());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].class_name, "Broken");
        assert!(matches!(
            report.failures[0].error,
            RowcastError::Schema(SchemaError::MissingPrimaryKey { .. })
        ));

        let (_, index) = report.index.unwrap();
        assert!(index.contains("pub mod cities_value;"));
        assert!(!index.contains("broken"));
    }

    #[test]
    fn test_generate_all_rejects_duplicate_type_names() {
        let mut registry = TableRegistry::new();
        registry.register(table("Image").with_value_name("Picture")).unwrap();
        registry.register(table("Photo").with_value_name("Picture")).unwrap();

        let report = registry.generate_all(&RustEmitter::new());
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].table.source_class(), "Image");
        assert_eq!(
            report.failures[0].error,
            RowcastError::Generation(GenerationError::DuplicateTypeName {
                name: "Picture".to_string(),
                first_class: "Image".to_string(),
            })
        );
    }

    #[test]
    fn test_generate_all_rejects_colliding_file_names() {
        let mut registry = TableRegistry::new();
        registry.register(table("Cities").with_value_name("CitiesValue")).unwrap();
        registry.register(table("Towns").with_value_name("Cities_Value")).unwrap();

        let report = registry.generate_all(&RustEmitter::new());
        let files: Vec<&str> = report.generated.iter().map(|g| g.file_name.as_str()).collect();
        assert_eq!(files, vec!["cities_value.rs"]);
        assert_eq!(
            report.failures[0].error,
            RowcastError::Generation(GenerationError::DuplicateFileName {
                name: "Cities_Value".to_string(),
                first_type: "CitiesValue".to_string(),
                file_name: "cities_value.rs".to_string(),
            })
        );

        let (_, index) = report.index.unwrap();
        assert_eq!(index.matches("pub mod cities_value;").count(), 1);
    }

    #[test]
    fn test_generate_table_emits_source() {
        let generated = generate_table(&table("Cities"), &RustEmitter::new()).unwrap();
        assert_eq!(generated.file_name, "cities_value.rs");
        assert!(generated.source.contains("pub struct CitiesValue"));
        assert_eq!(generated.table.table_name(), "Cities");
    }
}
