//! ROWCAST Cache - Lookup Cache Runtime
//!
//! Point lookups of lookup-table rows by primary key, backed by a
//! [`RowSource`] and cached per table with single-flight miss handling.
//!
//! ```ignore
//! let cache = LookupCache::with_defaults(table, value_type, source);
//!
//! let image = cache.lookup(42).await?;          // NotFound if absent
//! let maybe = cache.find(99).await?;            // Ok(None) if absent
//! cache.invalidate(42)?;
//! ```

pub mod config;
pub mod lookup;
pub mod source;
pub mod stats;

pub use config::CacheConfig;
pub use lookup::LookupCache;
pub use source::RowSource;
pub use stats::CacheStats;
