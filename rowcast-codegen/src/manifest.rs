//! Generation manifest
//!
//! A TOML file listing the table classes to generate and where to put the
//! output:
//!
//! ```toml
//! [output]
//! dir = "src/generated"
//! descriptors_json = true
//!
//! [[tables]]
//! class_name = "Image"
//! value = { name = "Picture" }
//! columns = [
//!     { name = "id", type = { kind = "integer" }, primary_key = true },
//!     { name = "path", type = { kind = "text" } },
//! ]
//! ```

use crate::registry::TableRegistry;
use rowcast_core::{ConfigError, TableClassMetadata};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Also write every descriptor to `descriptors.json`.
    #[serde(default)]
    pub descriptors_json: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            descriptors_json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationManifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tables: Vec<TableClassMetadata>,
}

impl GenerationManifest {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let manifest: GenerationManifest =
            toml::from_str(contents).map_err(|e| ConfigError::Parse {
                reason: e.to_string(),
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.tables.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tables".to_string(),
                reason: "at least one table is required".to_string(),
            });
        }
        for (i, table) in self.tables.iter().enumerate() {
            if table.class_name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("tables[{}].class_name", i),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Register every table, rejecting duplicate class names.
    pub fn registry(&self) -> Result<TableRegistry, ConfigError> {
        let mut registry = TableRegistry::new();
        for table in &self.tables {
            registry.register(table.clone())?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcast_core::ColumnType;

    const IMAGE_MANIFEST: &str = r#"
[output]
dir = "out"
descriptors_json = true

[[tables]]
class_name = "Image"
columns = [
    { name = "id", type = { kind = "integer" }, primary_key = true },
    { name = "path", type = { kind = "text" } },
]

[[tables]]
class_name = "UsersTable"
value = { name = "User" }
columns = [
    { name = "id", type = { kind = "varchar", length = 10 }, primary_key = true },
    { name = "cityId", type = { kind = "integer" }, nullable = true },
]
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = GenerationManifest::from_toml_str(IMAGE_MANIFEST).unwrap();
        assert_eq!(manifest.output.dir, PathBuf::from("out"));
        assert!(manifest.output.descriptors_json);
        assert_eq!(manifest.tables.len(), 2);

        let image = &manifest.tables[0];
        assert!(image.lookup_table);
        assert!(image.value.name.is_empty());
        assert_eq!(image.columns[0].column_type, ColumnType::Integer);
        assert!(image.columns[0].primary_key);

        let users = &manifest.tables[1];
        assert_eq!(users.value.name, "User");
        assert_eq!(users.columns[0].column_type, ColumnType::Varchar { length: 10 });
        assert!(users.columns[1].nullable);
    }

    #[test]
    fn test_output_defaults() {
        let manifest = GenerationManifest::from_toml_str(
            r#"
[[tables]]
class_name = "Image"
columns = [{ name = "id", type = { kind = "long" }, primary_key = true }]
"#,
        )
        .unwrap();
        assert_eq!(manifest.output, OutputConfig::default());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = GenerationManifest::from_toml_str(
            r#"
[output]
directory = "out"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_rejects_empty_manifest() {
        let err = GenerationManifest::from_toml_str("").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                field: "tables".to_string(),
                reason: "at least one table is required".to_string(),
            }
        );
    }

    #[test]
    fn test_registry_rejects_duplicate_classes() {
        let mut manifest = GenerationManifest::from_toml_str(IMAGE_MANIFEST).unwrap();
        manifest.tables.push(manifest.tables[0].clone());
        assert!(matches!(
            manifest.registry(),
            Err(ConfigError::DuplicateTable { .. })
        ));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = GenerationManifest::from_path(Path::new("/nonexistent/rowcast.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
