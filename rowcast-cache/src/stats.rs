//! Cache statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a cached value.
    pub hits: u64,
    /// Lookups that had to wait for a fetch.
    pub misses: u64,
    /// Lookups answered from a cached absence.
    pub negative_hits: u64,
    /// Source fetches actually issued.
    pub fetches: u64,
    /// Fetches that failed, including malformed rows.
    pub source_errors: u64,
    /// Keys removed by `invalidate`, plus one per `invalidate_all`.
    pub invalidations: u64,
    /// Entries currently cached (values and absences).
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0). Negative hits count as hits.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits + self.negative_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub negative_hits: AtomicU64,
    pub fetches: AtomicU64,
    pub source_errors: AtomicU64,
    pub invalidations: AtomicU64,
}

impl StatsCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entry_count: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            source_errors: self.source_errors.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entry_count: entry_count as u64,
        }
    }
}
