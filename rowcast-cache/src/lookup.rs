//! Single-flight lookup cache.
//!
//! A [`LookupCache`] maps primary keys of one lookup table to shared value
//! instances. Misses go to a [`RowSource`]; concurrent misses for the same key
//! share one fetch.
//!
//! # Miss path
//!
//! 1. Under the state lock: answer from the cache if possible, otherwise join
//!    the key's in-flight fetch or register a new one.
//! 2. Outside the lock: every caller awaits the flight's `OnceCell`. The first
//!    to arrive drives the fetch; if that caller is cancelled the next waiter
//!    takes over.
//! 3. Under the lock again: the driver unregisters the flight and stores the
//!    result, but only if the flight is still registered. An invalidation in
//!    the meantime unregisters it, so waiters still get the result while the
//!    cache forgets it.
//!
//! Errors are handed to every waiter and never cached.

use crate::config::CacheConfig;
use crate::source::RowSource;
use crate::stats::{CacheStats, StatsCounters};
use futures_util::future::try_join_all;
use rowcast_core::{
    FromRow, Key, LookupError, LookupTable, RowError, SourceError, TableDescriptor,
    ValueInstance, ValueTypeDescriptor,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

type FetchResult<V> = Result<Option<Arc<V>>, LookupError>;
type Flight<V> = OnceCell<FetchResult<V>>;

enum CacheEntry<V> {
    Present(Arc<V>),
    /// Known-absent key, only stored with negative caching enabled.
    Absent,
}

struct CacheState<V> {
    entries: HashMap<Key, CacheEntry<V>>,
    in_flight: HashMap<Key, Arc<Flight<V>>>,
}

impl<V> Default for CacheState<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }
}

/// Cache of value instances for one lookup table.
///
/// `V` is the value type built from fetched rows: [`ValueInstance`] by
/// default, or an emitted struct implementing [`FromRow`].
pub struct LookupCache<S: ?Sized, V = ValueInstance> {
    table: Arc<TableDescriptor>,
    value_type: Arc<ValueTypeDescriptor>,
    config: CacheConfig,
    state: Mutex<CacheState<V>>,
    stats: StatsCounters,
    source: Arc<S>,
}

impl<S, V> LookupCache<S, V>
where
    S: RowSource + ?Sized,
    V: FromRow,
{
    /// Create a cache for `table`, building values of `value_type` from rows
    /// fetched through `source`.
    pub fn new(
        table: Arc<TableDescriptor>,
        value_type: Arc<ValueTypeDescriptor>,
        source: Arc<S>,
        config: CacheConfig,
    ) -> Self {
        Self {
            table,
            value_type,
            config,
            state: Mutex::new(CacheState::default()),
            stats: StatsCounters::default(),
            source,
        }
    }

    /// Create a cache with default configuration.
    pub fn with_defaults(
        table: Arc<TableDescriptor>,
        value_type: Arc<ValueTypeDescriptor>,
        source: Arc<S>,
    ) -> Self {
        Self::new(table, value_type, source, CacheConfig::default())
    }

    /// Descriptor of the cached table.
    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    /// Field mapping applied to fetched rows.
    pub fn value_type(&self) -> &ValueTypeDescriptor {
        &self.value_type
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState<V>>, LookupError> {
        self.state.lock().map_err(|_| LookupError::LockPoisoned)
    }

    /// Coerce a caller key to the primary key column type.
    fn normalize(&self, key: Key) -> Result<Key, LookupError> {
        let expected = &self.table.primary_key().column_type;
        key.coerce_to(expected)
            .ok_or_else(|| LookupError::KeyTypeMismatch {
                table: self.table.table_name().to_string(),
                expected: expected.clone(),
                key,
            })
    }

    fn malformed(&self, error: RowError) -> LookupError {
        LookupError::Source(SourceError::MalformedRow {
            table: self.table.table_name().to_string(),
            error,
        })
    }

    /// Look up the value for `key`, failing with [`LookupError::NotFound`]
    /// if no row exists.
    pub async fn lookup(&self, key: impl Into<Key>) -> Result<Arc<V>, LookupError> {
        let key = self.normalize(key.into())?;
        match self.find_normalized(&key).await? {
            Some(value) => Ok(value),
            None => Err(LookupError::NotFound {
                table: self.table.table_name().to_string(),
                key,
            }),
        }
    }

    /// Look up the value for `key`; absence is `Ok(None)`.
    pub async fn find(&self, key: impl Into<Key>) -> Result<Option<Arc<V>>, LookupError> {
        let key = self.normalize(key.into())?;
        self.find_normalized(&key).await
    }

    /// Look up several keys concurrently. Results follow key order and
    /// absent keys are skipped; the first error fails the whole batch.
    pub async fn find_many<K, I>(&self, keys: I) -> Result<Vec<Arc<V>>, LookupError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let found = try_join_all(keys.into_iter().map(|key| self.find(key))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    async fn find_normalized(&self, key: &Key) -> FetchResult<V> {
        let flight = {
            let mut state = self.lock()?;
            match state.entries.get(key) {
                Some(CacheEntry::Present(value)) => {
                    StatsCounters::bump(&self.stats.hits);
                    return Ok(Some(Arc::clone(value)));
                }
                Some(CacheEntry::Absent) => {
                    StatsCounters::bump(&self.stats.negative_hits);
                    tracing::trace!(
                        table = %self.table.table_name(),
                        key = %key,
                        "Negative cache hit"
                    );
                    return Ok(None);
                }
                None => {}
            }

            StatsCounters::bump(&self.stats.misses);
            match state.in_flight.get(key) {
                Some(flight) => {
                    tracing::trace!(
                        table = %self.table.table_name(),
                        key = %key,
                        "Joining in-flight fetch"
                    );
                    Arc::clone(flight)
                }
                None => {
                    tracing::debug!(table = %self.table.table_name(), key = %key, "Cache miss");
                    let flight = Arc::new(OnceCell::new());
                    state.in_flight.insert(key.clone(), Arc::clone(&flight));
                    flight
                }
            }
        };

        flight
            .get_or_init(|| self.drive(key, &flight))
            .await
            .clone()
    }

    /// Run the fetch for a registered flight and settle the cache.
    async fn drive(&self, key: &Key, flight: &Arc<Flight<V>>) -> FetchResult<V> {
        StatsCounters::bump(&self.stats.fetches);
        tracing::debug!(table = %self.table.table_name(), key = %key, "Fetching row from source");

        let result = self.fetch(key).await;
        if let Err(error) = &result {
            StatsCounters::bump(&self.stats.source_errors);
            tracing::warn!(
                table = %self.table.table_name(),
                key = %key,
                error = %error,
                "Lookup fetch failed"
            );
        }

        let mut state = self.lock()?;
        let registered = state
            .in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, flight));
        if !registered {
            tracing::debug!(
                table = %self.table.table_name(),
                key = %key,
                "Key invalidated during fetch, result not retained"
            );
            return result;
        }

        state.in_flight.remove(key);
        match &result {
            Ok(Some(value)) => {
                state
                    .entries
                    .insert(key.clone(), CacheEntry::Present(Arc::clone(value)));
            }
            Ok(None) if self.config.negative_caching => {
                state.entries.insert(key.clone(), CacheEntry::Absent);
            }
            _ => {}
        }
        result
    }

    async fn fetch(&self, key: &Key) -> FetchResult<V> {
        let row = match self.source.fetch_by_key(&self.table, key).await? {
            Some(row) => row,
            None => {
                tracing::debug!(table = %self.table.table_name(), key = %key, "Row not found");
                return Ok(None);
            }
        };

        if self.config.verify_row_keys {
            let found = row.key(&self.table).map_err(|e| self.malformed(e))?;
            if &found != key {
                return Err(self.malformed(RowError::KeyMismatch {
                    expected: key.clone(),
                    found,
                }));
            }
        }

        let value = V::from_row(&self.value_type, &row).map_err(|e| self.malformed(e))?;
        Ok(Some(Arc::new(value)))
    }

    /// Forget `key`. Returns whether anything was cached or in flight for it.
    ///
    /// A fetch in flight for the key still completes for its waiters, but its
    /// result is not stored; later callers fetch again.
    pub fn invalidate(&self, key: impl Into<Key>) -> Result<bool, LookupError> {
        let key = match self.normalize(key.into()) {
            Ok(key) => key,
            // Keys that do not fit the primary key type are never cached.
            Err(_) => return Ok(false),
        };

        let mut state = self.lock()?;
        let removed = state.entries.remove(&key).is_some();
        let detached = state.in_flight.remove(&key).is_some();
        drop(state);

        if removed || detached {
            StatsCounters::bump(&self.stats.invalidations);
            tracing::debug!(
                table = %self.table.table_name(),
                key = %key,
                in_flight = detached,
                "Invalidated cache entry"
            );
        }
        Ok(removed || detached)
    }

    /// Forget every entry and detach every in-flight fetch.
    pub fn invalidate_all(&self) -> Result<(), LookupError> {
        let mut state = self.lock()?;
        let entries = state.entries.len();
        let in_flight = state.in_flight.len();
        state.entries.clear();
        state.in_flight.clear();
        drop(state);

        StatsCounters::bump(&self.stats.invalidations);
        tracing::debug!(
            table = %self.table.table_name(),
            entries,
            in_flight,
            "Invalidated all cache entries"
        );
        Ok(())
    }

    /// Number of cached entries (values and remembered absences).
    pub fn len(&self) -> Result<usize, LookupError> {
        Ok(self.lock()?.entries.len())
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> Result<bool, LookupError> {
        Ok(self.len()? == 0)
    }

    /// Whether a value is cached for `key`. Remembered absences do not count.
    pub fn contains(&self, key: impl Into<Key>) -> Result<bool, LookupError> {
        let key = match self.normalize(key.into()) {
            Ok(key) => key,
            Err(_) => return Ok(false),
        };
        Ok(matches!(
            self.lock()?.entries.get(&key),
            Some(CacheEntry::Present(_))
        ))
    }

    /// Snapshot of the cache counters and current entry count.
    pub fn stats(&self) -> Result<CacheStats, LookupError> {
        let entry_count = self.len()?;
        Ok(self.stats.snapshot(entry_count))
    }
}

impl<T, V> LookupCache<T, V>
where
    T: LookupTable + RowSource,
    V: FromRow,
{
    /// Build a cache for a type that is both the lookup table and its own
    /// row source.
    pub fn for_table(
        table: Arc<T>,
        value_type: Arc<ValueTypeDescriptor>,
        config: CacheConfig,
    ) -> Self {
        let descriptor = Arc::new(table.descriptor().clone());
        Self::new(descriptor, value_type, table, config)
    }
}
