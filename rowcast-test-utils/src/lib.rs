//! ROWCAST Test Utilities
//!
//! Shared test infrastructure for the ROWCAST workspace:
//! - A controllable in-memory row source
//! - Fixtures for the `Image` and `UsersTable` lookup tables
//! - Value structs emitted by `rowcast-gen` for those tables, checked in
//! - Proptest generators for schemas and keys
//! - Assertions for lookup outcomes

pub use rowcast_cache::{CacheConfig, LookupCache, RowSource};
pub use rowcast_core::{
    describe, ColumnMetadata, ColumnType, Key, LookupError, Row, RowcastError, SourceError,
    TableClassMetadata, TableDescriptor, Value, ValueInstance, ValueTypeDescriptor,
};

pub mod generated;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

// ============================================================================
// MOCK ROW SOURCE
// ============================================================================

/// In-memory row source with fetch counting, failure injection and an
/// optional gate that holds every fetch until released.
#[derive(Debug)]
pub struct MockRowSource {
    rows: RwLock<HashMap<Key, Row>>,
    failure: RwLock<Option<SourceError>>,
    fetches: AtomicUsize,
    per_key: Mutex<HashMap<Key, usize>>,
    started: watch::Sender<usize>,
    gate: Option<Semaphore>,
    delay: Option<Duration>,
}

impl Default for MockRowSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRowSource {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            fetches: AtomicUsize::new(0),
            per_key: Mutex::new(HashMap::new()),
            started: watch::channel(0).0,
            gate: None,
            delay: None,
        }
    }

    /// A source whose fetches block until [`release`](Self::release) is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Delay every fetch by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_row(self, key: impl Into<Key>, row: Row) -> Self {
        self.insert(key, row);
        self
    }

    pub fn insert(&self, key: impl Into<Key>, row: Row) {
        self.rows
            .write()
            .expect("rows lock poisoned")
            .insert(key.into(), row);
    }

    pub fn remove(&self, key: impl Into<Key>) -> Option<Row> {
        self.rows
            .write()
            .expect("rows lock poisoned")
            .remove(&key.into())
    }

    /// Make every following fetch fail with `error` (or succeed again with `None`).
    pub fn fail_with(&self, error: Option<SourceError>) {
        *self.failure.write().expect("failure lock poisoned") = error;
    }

    /// Let all gated fetches, current and future, proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.close();
        }
    }

    /// Total number of fetches issued.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of fetches issued for one key.
    pub fn fetch_count_for(&self, key: impl Into<Key>) -> usize {
        self.per_key
            .lock()
            .expect("per-key lock poisoned")
            .get(&key.into())
            .copied()
            .unwrap_or(0)
    }

    /// Wait until at least `count` fetches have started.
    pub async fn wait_for_fetches(&self, count: usize) {
        let mut started = self.started.subscribe();
        let _ = started.wait_for(|n| *n >= count).await;
    }
}

#[async_trait]
impl RowSource for MockRowSource {
    async fn fetch_by_key(
        &self,
        _table: &TableDescriptor,
        key: &Key,
    ) -> Result<Option<Row>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self
            .per_key
            .lock()
            .expect("per-key lock poisoned")
            .entry(key.clone())
            .or_insert(0) += 1;
        self.started.send_modify(|n| *n += 1);

        if let Some(gate) = &self.gate {
            // Closed gate means released.
            let _ = gate.acquire().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.read().expect("failure lock poisoned").clone() {
            return Err(error);
        }
        Ok(self
            .rows
            .read()
            .expect("rows lock poisoned")
            .get(key)
            .cloned())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures around the `Image(id INT pk, path TEXT)` table.

    use super::*;

    /// `Image` with an integer primary key `id` and a text `path`.
    pub fn image_table_metadata() -> TableClassMetadata {
        TableClassMetadata::new("Image")
            .with_column(ColumnMetadata::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnMetadata::new("path", ColumnType::Text))
    }

    pub fn image_table() -> Arc<TableDescriptor> {
        Arc::new(describe(&image_table_metadata()).expect("image table describes"))
    }

    pub fn image_value_type() -> Arc<ValueTypeDescriptor> {
        Arc::new(rowcast_codegen::generate(&image_table()).expect("image value type generates"))
    }

    pub fn image_row(id: i32, path: &str) -> Row {
        Row::new().with("id", id).with("path", path)
    }

    /// Source holding `Image(42, "/a.png")`.
    pub fn image_source() -> MockRowSource {
        MockRowSource::new().with_row(42, image_row(42, "/a.png"))
    }

    /// Cache over `source` for the `Image` table.
    pub fn image_cache(
        source: Arc<MockRowSource>,
        config: CacheConfig,
    ) -> LookupCache<MockRowSource> {
        LookupCache::new(image_table(), image_value_type(), source, config)
    }

    /// `UsersTable` (table `Users`): a VARCHAR key, an enumerated `type` and
    /// a nullable camelCase `cityId`.
    pub fn users_table_metadata() -> TableClassMetadata {
        TableClassMetadata::new("UsersTable")
            .with_column(
                ColumnMetadata::new("id", ColumnType::Varchar { length: 10 }).primary_key(),
            )
            .with_column(ColumnMetadata::new("name", ColumnType::Varchar { length: 50 }))
            .with_column(ColumnMetadata::new(
                "type",
                ColumnType::Enumeration {
                    variants: vec!["ADMIN".to_string(), "USER".to_string()],
                },
            ))
            .with_column(ColumnMetadata::new("cityId", ColumnType::Integer).nullable())
    }

    pub fn users_table() -> Arc<TableDescriptor> {
        Arc::new(describe(&users_table_metadata()).expect("users table describes"))
    }

    pub fn users_value_type() -> Arc<ValueTypeDescriptor> {
        Arc::new(rowcast_codegen::generate(&users_table()).expect("users value type generates"))
    }

    pub fn users_row(id: &str, name: &str, kind: &str, city_id: Option<i32>) -> Row {
        Row::new()
            .with("id", id)
            .with("name", name)
            .with("type", kind)
            .with("cityId", city_id)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for schemas and keys.

    use super::*;
    use proptest::prelude::*;
    use rowcast_core::ident::is_keyword;

    /// Any column type, including parameterized ones.
    pub fn arb_column_type() -> impl Strategy<Value = ColumnType> {
        prop_oneof![
            Just(ColumnType::Short),
            Just(ColumnType::Integer),
            Just(ColumnType::Long),
            Just(ColumnType::Float),
            Just(ColumnType::Double),
            (1u32..38, 0u32..10).prop_map(|(precision, scale)| ColumnType::Decimal {
                precision,
                scale: scale.min(precision),
            }),
            Just(ColumnType::Char),
            Just(ColumnType::Bool),
            Just(ColumnType::Text),
            (1u32..256).prop_map(|length| ColumnType::Varchar { length }),
            Just(ColumnType::Date),
            Just(ColumnType::DateTime),
            Just(ColumnType::Timestamp),
            Just(ColumnType::Blob),
            prop::collection::vec("[A-Z]{1,8}", 1..4)
                .prop_map(|variants| ColumnType::Enumeration { variants }),
            Just(ColumnType::Uuid),
        ]
    }

    /// Column types allowed for a primary key.
    pub fn arb_key_column_type() -> impl Strategy<Value = ColumnType> {
        arb_column_type().prop_filter("primary key type", ColumnType::is_key_type)
    }

    /// A CamelCase identifier usable as a class name.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[A-Z][a-zA-Z0-9]{0,15}".prop_filter("keywords are not identifiers", |s| !is_keyword(s))
    }

    /// A snake_case column name.
    pub fn arb_column_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,10}".prop_filter("keywords are not column names", |s| !is_keyword(s))
    }

    /// Valid lookup table metadata: distinct column names, exactly one
    /// non-null primary key of a key type.
    pub fn arb_table_metadata() -> impl Strategy<Value = TableClassMetadata> {
        (
            arb_identifier(),
            arb_key_column_type(),
            prop::collection::btree_map(arb_column_name(), (arb_column_type(), any::<bool>()), 0..6),
        )
            .prop_map(|(class_name, key_type, others)| {
                let mut meta = TableClassMetadata::new(class_name)
                    .with_column(ColumnMetadata::new("pk", key_type).primary_key());
                for (name, (column_type, nullable)) in others {
                    if name == "pk" {
                        continue;
                    }
                    let column = ColumnMetadata::new(name, column_type);
                    meta = meta.with_column(if nullable { column.nullable() } else { column });
                }
                meta
            })
    }

    /// A key of any kind.
    pub fn arb_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            any::<i16>().prop_map(Key::Short),
            any::<i32>().prop_map(Key::Int),
            any::<i64>().prop_map(Key::Long),
            "[a-z]{1,12}".prop_map(Key::Text),
            any::<[u8; 16]>().prop_map(|b| Key::Uuid(uuid::Uuid::from_bytes(b))),
        ]
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for lookup outcomes.

    use super::*;

    /// Assert that a lookup failed with `NotFound` for `key`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &Result<T, LookupError>, key: impl Into<Key>) {
        let expected = key.into();
        match result {
            Err(LookupError::NotFound { key, .. }) => {
                assert_eq!(*key, expected, "Wrong key in NotFound error");
            }
            other => panic!("Expected NotFound for {}, got: {:?}", expected, other),
        }
    }

    /// Assert that a lookup failed with a data source error.
    #[track_caller]
    pub fn assert_source_error<T: std::fmt::Debug>(result: &Result<T, LookupError>) {
        match result {
            Err(LookupError::Source(_)) => {}
            other => panic!("Expected source error, got: {:?}", other),
        }
    }
}
