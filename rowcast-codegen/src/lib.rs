//! ROWCAST Codegen - Value Type Generator
//!
//! Turns registered table classes into value type descriptors and emits
//! source for them. The pipeline per table is
//! `TableClassMetadata` → [`describe`](rowcast_core::describe) →
//! [`generate`] → [`CodeEmitter::emit`].
//!
//! Generation is deterministic: the same descriptor always yields the same
//! source text.

pub mod emitter;
pub mod generator;
pub mod manifest;
pub mod output;
pub mod registry;

pub use emitter::{rust_type, CodeEmitter, JsonEmitter, RustEmitter};
pub use generator::{generate, sanitize_field_name};
pub use manifest::{GenerationManifest, OutputConfig, DEFAULT_OUTPUT_DIR};
pub use output::{write_report, DESCRIPTORS_FILE};
pub use registry::{
    generate_table, GeneratedTable, GenerationReport, TableFailure, TableRegistry,
};
