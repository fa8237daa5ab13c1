//! Data source abstraction for the lookup cache.

use async_trait::async_trait;
use rowcast_core::{Key, Row, SourceError, TableDescriptor};

/// Fetches single rows by primary key from the underlying store.
///
/// Returning `Ok(None)` means the row does not exist; the cache decides
/// whether that absence is remembered.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_by_key(
        &self,
        table: &TableDescriptor,
        key: &Key,
    ) -> Result<Option<Row>, SourceError>;
}
