//! ROWCAST Core - Descriptor Model
//!
//! Data types shared by the generator and the lookup cache runtime:
//! table descriptors, generated value type descriptors, cell values, rows,
//! primary keys, and the error taxonomy. No I/O and no async here.

pub mod column;
pub mod descriptor;
pub mod error;
pub mod ident;
pub mod row;
pub mod value;
pub mod value_type;

pub use column::{ColumnDescriptor, ColumnMetadata, ColumnType};
pub use descriptor::{
    default_table_name, describe, resolve_value_type_name, LookupTable, TableClassMetadata,
    TableDescriptor, ValueAnnotation, TABLE_SUFFIX, VALUE_SUFFIX,
};
pub use error::{
    ConfigError, GenerationError, LookupError, RowError, RowcastError, RowcastResult,
    SchemaError, SourceError,
};
pub use row::Row;
pub use value::{FromValue, Key, Value};
pub use value_type::{FromRow, GeneratedField, ValueInstance, ValueTypeDescriptor};

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
