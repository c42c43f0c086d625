//! In-memory storage implementation for document stores.
//!
//! This module provides the [`InMemoryStore`] backend: every collection lives in a
//! [`Snapshot`] behind an async-safe read-write lock, and each committed mutation
//! flushes the whole snapshot to a pluggable [`SnapshotStorage`].

use std::{fmt, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::Bson;
use tracing::{info, warn};

use docrest_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    config::StoreConfig,
    document::{ID_FIELD, Record, display_value, ids_match, parse_id, record_id},
    error::{DocumentStoreError, DocumentStoreResult},
    page::Page,
    path::CollectionRegistry,
    query::QueryPlan,
    snapshot::{Snapshot, SnapshotStorage},
    validate::{AcceptAll, Validator},
};

use crate::{pipeline, snapshot::MemorySnapshot};


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait on top of a [`Snapshot`] guarded
/// by an async-aware read-write lock. Reads share the lock; each mutation holds the
/// write lock from its first read until its flush has completed, so mutations are
/// serialized and never observed half-done.
///
/// # Persistence
///
/// The snapshot is loaded from the configured [`SnapshotStorage`] once, when the store
/// is built, and flushed in full after every successful mutation. If a flush fails the
/// mutated collection is restored and the storage error is returned.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state, so clones share
/// the same records and can be moved across async tasks.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::{InMemoryStore, MemorySnapshot};
/// use docrest::backend::StoreBackendBuilder;
/// use bson::doc;
///
/// let store = InMemoryStore::builder()
///     .storage(MemorySnapshot::from_json(serde_json::json!({ "products": [] }))?)
///     .build()
///     .await?;
///
/// let created = store.create("products", doc! { "name": "Dune" }).await?;
/// assert_eq!(created.get_i64("id")?, 1);
/// ```
pub struct InMemoryStore<S: SnapshotStorage = MemorySnapshot> {
    state: Arc<RwLock<Snapshot>>,
    storage: Arc<S>,
    validator: Arc<dyn Validator>,
    config: StoreConfig,
}

impl InMemoryStore<MemorySnapshot> {
    /// Creates an empty store with default configuration and no schema validation.
    ///
    /// The store has no collections, so reads and writes fail with
    /// `CollectionNotFound` unless the store is built with
    /// [`create_missing_collections`](StoreConfig::create_missing_collections).
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Snapshot::new())),
            storage: Arc::new(MemorySnapshot::default()),
            validator: Arc::new(AcceptAll),
            config: StoreConfig::default(),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom storage,
    /// validator or configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docrest_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder().build().await.unwrap();
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

impl Default for InMemoryStore<MemorySnapshot> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SnapshotStorage> InMemoryStore<S> {
    /// Returns the storage the store flushes to.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns a copy of the current in-memory state.
    pub async fn snapshot(&self) -> Snapshot {
        self.state
            .read()
            .await
            .clone()
    }

    fn missing_collection(collection: &str) -> DocumentStoreError {
        DocumentStoreError::CollectionNotFound(collection.to_string())
    }

    fn missing_record(collection: &str, id: &Bson) -> DocumentStoreError {
        DocumentStoreError::DocumentNotFound(display_value(id), collection.to_string())
    }

    fn validate(&self, collection: &str, record: &Record) -> DocumentStoreResult<()> {
        self.validator
            .validate(collection, record)
            .map_err(DocumentStoreError::Validation)
    }

    /// Returns the current records of a collection about to be written, for rollback.
    ///
    /// `Ok(None)` means the collection does not exist and the write may create it.
    fn previous_records(
        &self,
        state: &Snapshot,
        collection: &str,
        may_create: bool,
    ) -> DocumentStoreResult<Option<Vec<Record>>> {
        match state.collection(collection) {
            Some(records) => Ok(Some(records.clone())),
            None if may_create && self.config.create_missing_collections => Ok(None),
            None => Err(Self::missing_collection(collection)),
        }
    }

    /// Flushes the mutated snapshot, restoring `collection` to `previous` on failure.
    async fn commit(
        &self,
        state: &mut Snapshot,
        collection: &str,
        previous: Option<Vec<Record>>,
    ) -> DocumentStoreResult<()> {
        if let Err(err) = self.storage.flush(state).await {
            warn!(collection, error = %err, "snapshot flush failed, rolling back");
            state.restore_collection(collection, previous);

            return Err(err);
        }

        Ok(())
    }
}

impl<S: SnapshotStorage> Clone for InMemoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            storage: Arc::clone(&self.storage),
            validator: Arc::clone(&self.validator),
            config: self.config.clone(),
        }
    }
}

impl<S: SnapshotStorage> fmt::Debug for InMemoryStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("storage", &self.storage)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Picks an id for a record created without one.
///
/// One more than the largest id when every id in the collection is an integer and
/// the successor fits in an `i64`, a random UUID string otherwise.
fn next_id(records: &[Record]) -> Bson {
    let mut max = 0i64;

    for id in records.iter().filter_map(record_id) {
        match id {
            Bson::Int32(value) => max = max.max(i64::from(*value)),
            Bson::Int64(value) => max = max.max(*value),
            _ => return random_id(),
        }
    }

    max.checked_add(1).map_or_else(random_id, Bson::Int64)
}

fn random_id() -> Bson {
    Bson::String(uuid::Uuid::new_v4().to_string())
}

/// Reads an addressed id as it should be stored: integral text becomes a number.
fn stored_form(id: &Bson) -> Bson {
    match id {
        Bson::String(text) => parse_id(text),
        other => other.clone(),
    }
}

/// Returns `record` carrying `id`, keeping the field's position or putting it first.
fn with_id(record: Record, id: Bson) -> Record {
    if record.contains_key(ID_FIELD) {
        let mut record = record;
        record.insert(ID_FIELD, id);
        return record;
    }

    let mut stamped = Record::new();
    stamped.insert(ID_FIELD, id);
    for (field, value) in record {
        stamped.insert(field, value);
    }
    stamped
}

fn position(records: &[Record], id: &Bson) -> Option<usize> {
    records
        .iter()
        .position(|record| record_id(record).is_some_and(|stored| ids_match(stored, id)))
}

#[async_trait]
impl<S: SnapshotStorage + 'static> StoreBackend for InMemoryStore<S> {
    fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn list(&self, collection: &str, plan: &QueryPlan) -> DocumentStoreResult<Page<Record>> {
        let state = self.state.read().await;
        let records = state
            .collection(collection)
            .ok_or_else(|| Self::missing_collection(collection))?;

        pipeline::execute(records, plan, &*state)
    }

    async fn show(&self, collection: &str, id: &Bson, embed: &[String]) -> DocumentStoreResult<Record> {
        let state = self.state.read().await;

        if state.collection(collection).is_none() {
            return Err(Self::missing_collection(collection));
        }

        let mut record = state
            .find_by_id(collection, id)
            .cloned()
            .ok_or_else(|| Self::missing_record(collection, id))?;

        pipeline::embed(&mut record, embed, &*state);

        Ok(record)
    }

    async fn create(&self, collection: &str, record: Record) -> DocumentStoreResult<Record> {
        let mut state = self.state.write().await;
        let previous = self.previous_records(&state, collection, true)?;
        let existing = previous.as_deref().unwrap_or_default();

        if let Some(id) = record_id(&record).filter(|id| position(existing, id).is_some()) {
            return Err(DocumentStoreError::DocumentAlreadyExists(
                display_value(id),
                collection.to_string(),
            ));
        }

        let record = if record_id(&record).is_none() && self.config.assign_ids {
            let mut record = record;
            record.remove(ID_FIELD);
            with_id(record, next_id(existing))
        } else {
            record
        };

        self.validate(collection, &record)?;

        state
            .collection_or_create(collection)
            .push(record.clone());
        self.commit(&mut state, collection, previous).await?;

        info!(
            collection,
            id = %record_id(&record).map(display_value).unwrap_or_default(),
            "created record"
        );

        Ok(record)
    }

    async fn replace(&self, collection: &str, id: &Bson, record: Record) -> DocumentStoreResult<Record> {
        let mut state = self.state.write().await;
        let previous = self.previous_records(&state, collection, true)?;
        let index = previous
            .as_deref()
            .and_then(|records| position(records, id));

        // an existing record keeps its stored id representation
        let stored_id = match (index, previous.as_deref()) {
            (Some(index), Some(records)) => records[index]
                .get(ID_FIELD)
                .cloned()
                .unwrap_or_else(|| stored_form(id)),
            _ => stored_form(id),
        };
        let record = with_id(record, stored_id);

        self.validate(collection, &record)?;

        let records = state.collection_or_create(collection);
        match index {
            Some(index) => records[index] = record.clone(),
            None => records.push(record.clone()),
        }
        self.commit(&mut state, collection, previous).await?;

        info!(collection, id = %display_value(id), appended = index.is_none(), "replaced record");

        Ok(record)
    }

    async fn merge(&self, collection: &str, id: &Bson, partial: Record) -> DocumentStoreResult<Record> {
        let mut state = self.state.write().await;
        let previous = self.previous_records(&state, collection, false)?;
        let records = previous.as_deref().unwrap_or_default();
        let index = position(records, id).ok_or_else(|| Self::missing_record(collection, id))?;

        let mut merged = records[index].clone();
        for (field, value) in partial {
            if field != ID_FIELD {
                merged.insert(field, value);
            }
        }

        self.validate(collection, &merged)?;

        state.collection_or_create(collection)[index] = merged.clone();
        self.commit(&mut state, collection, previous).await?;

        info!(collection, id = %display_value(id), "merged record");

        Ok(merged)
    }

    async fn delete(&self, collection: &str, id: &Bson) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;
        let previous = self.previous_records(&state, collection, false)?;
        let index = previous
            .as_deref()
            .and_then(|records| position(records, id))
            .ok_or_else(|| Self::missing_record(collection, id))?;

        state.collection_or_create(collection).remove(index);
        self.commit(&mut state, collection, previous).await?;

        info!(collection, id = %display_value(id), "deleted record");

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.state
                .read()
                .await
                .collection_names()
        )
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// Defaults to an empty [`MemorySnapshot`], the [`AcceptAll`] validator and
/// [`StoreConfig::default`].
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder()
///     .validator(|_: &str, _: &Record| Ok(()))
///     .config(StoreConfig::new().strict_operators(true))
///     .build()
///     .await?;
/// ```
pub struct InMemoryStoreBuilder<S = MemorySnapshot> {
    storage: S,
    validator: Arc<dyn Validator>,
    config: StoreConfig,
}

impl Default for InMemoryStoreBuilder<MemorySnapshot> {
    fn default() -> Self {
        Self {
            storage: MemorySnapshot::default(),
            validator: Arc::new(AcceptAll),
            config: StoreConfig::default(),
        }
    }
}

impl<S: SnapshotStorage> InMemoryStoreBuilder<S> {
    /// Sets the storage the snapshot is loaded from and flushed to.
    pub fn storage<T: SnapshotStorage>(self, storage: T) -> InMemoryStoreBuilder<T> {
        InMemoryStoreBuilder {
            storage,
            validator: self.validator,
            config: self.config,
        }
    }

    /// Sets the schema validator consulted before every create, replace and merge.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl<S: SnapshotStorage + 'static> StoreBackendBuilder for InMemoryStoreBuilder<S> {
    type Backend = InMemoryStore<S>;

    /// Loads the snapshot from the storage and returns the ready store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let snapshot = self.storage.load().await?;

        info!(collections = ?snapshot.collection_names(), "loaded snapshot");

        Ok(InMemoryStore {
            state: Arc::new(RwLock::new(snapshot)),
            storage: Arc::new(self.storage),
            validator: self.validator,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docrest_core::{query::Filter, validate::ValidationIssue};

    fn seed() -> Snapshot {
        Snapshot::new()
            .with_collection("products", vec![
                doc! { "id": 1, "name": "Dune", "price": 10 },
                doc! { "id": 2, "name": "Chess", "price": 25 },
                doc! { "id": 3, "name": "Go", "price": 40 },
            ])
            .with_collection("tags", vec![
                doc! { "id": "a", "label": "new" },
            ])
    }

    async fn store() -> (InMemoryStore, MemorySnapshot) {
        let storage = MemorySnapshot::new(seed());
        let store = InMemoryStore::builder()
            .storage(storage.clone())
            .build()
            .await
            .unwrap();

        (store, storage)
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records
            .iter()
            .map(|record| record.get_str("name").unwrap())
            .collect()
    }

    #[derive(Debug)]
    struct BrokenStorage;

    #[async_trait]
    impl SnapshotStorage for BrokenStorage {
        async fn load(&self) -> DocumentStoreResult<Snapshot> {
            Ok(seed())
        }

        async fn flush(&self, _snapshot: &Snapshot) -> DocumentStoreResult<()> {
            Err(DocumentStoreError::Persistence("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_build_loads_the_snapshot() {
        let (store, _) = store().await;

        assert_eq!(store.list_collections().await.unwrap(), vec!["products", "tags"]);
        assert_eq!(store.snapshot().await, seed());
    }

    #[tokio::test]
    async fn test_list_runs_the_plan() {
        let (store, _) = store().await;
        let plan = QueryPlan::builder().filter(Filter::gte("price", "20")).build();

        let page = store.list("products", &plan).await.unwrap();

        assert_eq!(names(&page.items), vec!["Chess", "Go"]);
        assert_eq!(page.count, 2);
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let (store, _) = store().await;

        assert!(matches!(
            store.list("users", &QueryPlan::new()).await,
            Err(DocumentStoreError::CollectionNotFound(name)) if name == "users",
        ));
        assert!(matches!(
            store.create("users", doc! { "name": "Alice" }).await,
            Err(DocumentStoreError::CollectionNotFound(_)),
        ));
    }

    #[tokio::test]
    async fn test_create_missing_collection_when_configured() {
        let store = InMemoryStore::builder()
            .config(StoreConfig::new().create_missing_collections(true))
            .build()
            .await
            .unwrap();

        let created = store.create("users", doc! { "name": "Alice" }).await.unwrap();

        assert_eq!(created, doc! { "id": 1_i64, "name": "Alice" });
        assert_eq!(store.list_collections().await.unwrap(), vec!["users"]);
    }

    #[tokio::test]
    async fn test_show_matches_ids_loosely() {
        let (store, _) = store().await;

        let record = store.show("products", &Bson::String("2".into()), &[]).await.unwrap();
        assert_eq!(record.get_str("name").unwrap(), "Chess");

        let missing = store.show("products", &Bson::Int64(9), &[]).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_flushes() {
        let (store, storage) = store().await;

        let product = store.create("products", doc! { "name": "Catan" }).await.unwrap();
        assert_eq!(product, doc! { "id": 4_i64, "name": "Catan" });

        let tag = store.create("tags", doc! { "label": "sale" }).await.unwrap();
        assert!(matches!(tag.get(ID_FIELD), Some(Bson::String(id)) if id.len() == 36));

        assert_eq!(storage.flush_count(), 2);
        assert_eq!(storage.persisted().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_create_without_id_assignment() {
        let store = InMemoryStore::builder()
            .storage(MemorySnapshot::new(seed()))
            .config(StoreConfig::new().assign_ids(false))
            .build()
            .await
            .unwrap();

        let created = store.create("products", doc! { "name": "Catan" }).await.unwrap();

        assert_eq!(created, doc! { "name": "Catan" });
    }

    #[tokio::test]
    async fn test_create_conflict_leaves_collection_unchanged() {
        let (store, storage) = store().await;

        let err = store
            .create("products", doc! { "id": 2, "name": "Twice" })
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(ref id, _) if id == "2"));
        assert_eq!(err.status_code(), 409);
        assert_eq!(store.snapshot().await.collection("products").unwrap().len(), 3);
        assert_eq!(storage.flush_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_prevents_mutation() {
        let validator = |_: &str, record: &Record| {
            match record.get("price") {
                Some(Bson::Int32(_) | Bson::Int64(_)) => Ok(()),
                _ => Err(vec![ValidationIssue::new("price", "must be an integer")]),
            }
        };
        let store = InMemoryStore::builder()
            .storage(MemorySnapshot::new(seed()))
            .validator(validator)
            .build()
            .await
            .unwrap();

        let err = store
            .merge("products", &Bson::Int32(1), doc! { "price": "free" })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DocumentStoreError::Validation(ref issues) if issues == &[ValidationIssue::new("price", "must be an integer")],
        ));
        assert_eq!(store.snapshot().await, seed());
    }

    #[tokio::test]
    async fn test_merge_keeps_fields_and_id() {
        let (store, _) = store().await;

        let merged = store
            .merge("products", &Bson::String("1".into()), doc! { "id": 99, "price": 12 })
            .await
            .unwrap();

        assert_eq!(merged, doc! { "id": 1, "name": "Dune", "price": 12 });
        assert_eq!(
            store.snapshot().await.collection("products").unwrap()[0],
            merged,
        );
    }

    #[tokio::test]
    async fn test_merge_missing_record() {
        let (store, _) = store().await;

        let err = store
            .merge("products", &Bson::Int32(9), doc! { "price": 12 })
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::DocumentNotFound(ref id, _) if id == "9"));
    }

    #[tokio::test]
    async fn test_replace_drops_fields_and_keeps_position() {
        let (store, _) = store().await;

        let replaced = store
            .replace("products", &Bson::Int64(2), doc! { "name": "Checkers" })
            .await
            .unwrap();

        assert_eq!(replaced, doc! { "id": 2, "name": "Checkers" });
        assert_eq!(
            names(store.snapshot().await.collection("products").unwrap()),
            vec!["Dune", "Checkers", "Go"],
        );
    }

    #[tokio::test]
    async fn test_replace_appends_absent_record() {
        let (store, _) = store().await;

        let replaced = store
            .replace("products", &Bson::Int64(7), doc! { "id": 8, "name": "Catan" })
            .await
            .unwrap();

        assert_eq!(replaced, doc! { "id": 7_i64, "name": "Catan" });
        assert_eq!(store.snapshot().await.collection("products").unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_replace_absent_text_id_stays_integer() {
        let (store, _) = store().await;

        let replaced = store
            .replace("products", &Bson::String("7".into()), doc! { "name": "Catan" })
            .await
            .unwrap();
        assert_eq!(replaced, doc! { "id": 7_i64, "name": "Catan" });

        let created = store.create("products", doc! { "name": "Risk" }).await.unwrap();
        assert_eq!(created, doc! { "id": 8_i64, "name": "Risk" });
    }

    #[tokio::test]
    async fn test_replace_absent_text_id_in_string_keyed_collection() {
        let (store, _) = store().await;

        let replaced = store
            .replace("tags", &Bson::String("b".into()), doc! { "label": "old" })
            .await
            .unwrap();

        assert_eq!(replaced, doc! { "id": "b", "label": "old" });
    }

    #[tokio::test]
    async fn test_next_id_falls_back_to_uuid_at_i64_max() {
        let storage = MemorySnapshot::new(
            Snapshot::new().with_collection("products", vec![doc! { "id": i64::MAX, "name": "Last" }]),
        );
        let store = InMemoryStore::builder().storage(storage).build().await.unwrap();

        let created = store.create("products", doc! { "name": "Next" }).await.unwrap();

        assert!(matches!(created.get(ID_FIELD), Some(Bson::String(id)) if id.len() == 36));
        assert_eq!(store.snapshot().await.collection("products").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_preserves_order() {
        let (store, storage) = store().await;

        store.delete("products", &Bson::Int32(2)).await.unwrap();

        assert_eq!(
            names(storage.persisted().await.collection("products").unwrap()),
            vec!["Dune", "Go"],
        );
        assert!(store.delete("products", &Bson::Int32(2)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_failed_flush_rolls_back() {
        let store = InMemoryStore::builder()
            .storage(BrokenStorage)
            .config(StoreConfig::new().create_missing_collections(true))
            .build()
            .await
            .unwrap();

        assert!(matches!(
            store.create("products", doc! { "name": "Catan" }).await,
            Err(DocumentStoreError::Persistence(_)),
        ));
        assert!(store.delete("products", &Bson::Int32(1)).await.is_err());
        assert!(store.create("users", doc! { "name": "Alice" }).await.is_err());

        assert_eq!(store.snapshot().await, seed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids() {
        let (store, storage) = store().await;

        let tasks: Vec<_> = (0..16)
            .map(|index| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create("products", doc! { "name": format!("item-{index}") })
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap().get_i64(ID_FIELD).unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (4..20).collect::<Vec<_>>());
        assert_eq!(storage.flush_count(), 16);
    }
}
