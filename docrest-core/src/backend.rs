//! Storage backend abstraction for the document store.
//!
//! The [`StoreBackend`] trait is the CRUD surface a transport layer drives: list with a
//! compiled query, show by id, and the four validated mutations. Implementations own the
//! records, the validator and the persistence strategy.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docrest::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! let created = backend.create("users", doc! { "name": "Alice" }).await?;
//! let page = backend.list("users", &QueryPlan::new()).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Bson;
use std::fmt::Debug;

use crate::{
    config::StoreConfig,
    document::Record,
    error::DocumentStoreResult,
    page::Page,
    query::QueryPlan,
};

/// Abstract interface for document storage backends.
///
/// # Consistency
///
/// Every mutation runs its read-validate-mutate-flush sequence as one unit: concurrent
/// operations observe either none or all of its effects, and a failed mutation (including
/// a failed flush) leaves the store unchanged.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Unknown collections yield [`CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// The configuration the backend was built with.
    fn config(&self) -> &StoreConfig;

    /// Runs a compiled query against a collection.
    ///
    /// Returns the matching records and the post-filter total.
    async fn list(&self, collection: &str, plan: &QueryPlan) -> DocumentStoreResult<Page<Record>>;

    /// Returns the record with the given id, with `embed` fields expanded.
    ///
    /// Fails with [`DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound)
    /// if no record matches.
    async fn show(&self, collection: &str, id: &Bson, embed: &[String]) -> DocumentStoreResult<Record>;

    /// Appends a new record and returns it as stored.
    ///
    /// Fails with `DocumentAlreadyExists` if the record's id is taken and with
    /// `Validation` if the validator rejects it.
    async fn create(&self, collection: &str, record: Record) -> DocumentStoreResult<Record>;

    /// Substitutes the record with the given id, appending it if absent.
    async fn replace(&self, collection: &str, id: &Bson, record: Record) -> DocumentStoreResult<Record>;

    /// Shallow-merges `partial` onto the record with the given id.
    ///
    /// Fails with `DocumentNotFound` if no record matches.
    async fn merge(&self, collection: &str, id: &Bson, partial: Record) -> DocumentStoreResult<Record>;

    /// Removes the record with the given id.
    async fn delete(&self, collection: &str, id: &Bson) -> DocumentStoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for asynchronously constructing backends.
///
/// Building typically loads the persisted snapshot.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
