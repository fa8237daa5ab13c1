//! Writing generation results to disk.

use crate::registry::GenerationReport;
use rowcast_core::{ConfigError, ValueTypeDescriptor};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the combined descriptor dump.
pub const DESCRIPTORS_FILE: &str = "descriptors.json";

fn io_error(path: &Path, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf, ConfigError> {
    fs::write(&path, contents).map_err(|e| io_error(&path, e))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "Wrote generated file");
    Ok(path)
}

/// Write every generated table, the emitter's index file and, optionally,
/// `descriptors.json` into `dir`. Returns the paths written.
///
/// Failed tables are not written; the report still carries them.
pub fn write_report(
    report: &GenerationReport,
    dir: &Path,
    descriptors_json: bool,
) -> Result<Vec<PathBuf>, ConfigError> {
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let mut written = Vec::with_capacity(report.generated.len() + 2);
    for generated in &report.generated {
        written.push(write_file(dir.join(&generated.file_name), &generated.source)?);
    }

    if let Some((file_name, contents)) = &report.index {
        written.push(write_file(dir.join(file_name), contents)?);
    }

    if descriptors_json {
        let descriptors: Vec<&ValueTypeDescriptor> = report
            .generated
            .iter()
            .map(|g| g.value_type.as_ref())
            .collect();
        let json = serde_json::to_string_pretty(&descriptors).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        written.push(write_file(dir.join(DESCRIPTORS_FILE), &json)?);
    }

    tracing::info!(
        dir = %dir.display(),
        files = written.len(),
        "Generation output written"
    );
    Ok(written)
}
