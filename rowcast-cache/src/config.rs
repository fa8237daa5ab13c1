//! Cache policy configuration

use serde::{Deserialize, Serialize};

/// Configuration for a [`LookupCache`](crate::LookupCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheConfig {
    /// Remember keys the source reported absent until they are invalidated.
    pub negative_caching: bool,
    /// Reject fetched rows whose primary key differs from the requested key.
    pub verify_row_keys: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            negative_caching: false,
            verify_row_keys: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable negative caching.
    pub fn with_negative_caching(mut self, enabled: bool) -> Self {
        self.negative_caching = enabled;
        self
    }

    /// Enable or disable row key verification.
    pub fn with_row_key_verification(mut self, enabled: bool) -> Self {
        self.verify_row_keys = enabled;
        self
    }
}
