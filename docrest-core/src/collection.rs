//! Collection handles for document store operations.
//!
//! A [`Collection`] binds a collection name to a backend and exposes the CRUD surface
//! with the argument shapes a transport layer has at hand: raw query parameters for
//! listing, an `_embed` parameter for showing, and ids as BSON values or path text.
//!
//! # Example
//!
//! ```ignore
//! use docrest::prelude::*;
//! use bson::doc;
//!
//! # async fn example(store: &DocumentStore<impl StoreBackend>) -> DocumentStoreResult<()> {
//! let orders = store.collection("orders");
//! let created = orders.create(doc! { "product": 7, "count": 2 }).await?;
//!
//! let page = orders
//!     .list(&QueryParams::from_pairs([("_embed", "product"), ("_start", "0"), ("_end", "10")]))
//!     .await?;
//! # Ok(()) }
//! ```

use bson::Bson;

use crate::{
    backend::StoreBackend,
    document::Record,
    error::DocumentStoreResult,
    page::Page,
    query::{QueryParams, QueryPlan, split_list},
};

/// A collection with a reference to a storage backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    /// Creates a new collection reference (internal use).
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lists records matching the given request parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuery`](crate::error::DocumentStoreError::InvalidQuery) for malformed
    /// parameters and [`TypeMismatch`](crate::error::DocumentStoreError::TypeMismatch) when a
    /// comparison filter meets an incomparable value.
    pub async fn list(&self, params: &QueryParams) -> DocumentStoreResult<Page<Record>> {
        let plan = QueryPlan::compile(params, self.backend.config())?;

        self.query(&plan).await
    }

    /// Runs an already compiled plan.
    pub async fn query(&self, plan: &QueryPlan) -> DocumentStoreResult<Page<Record>> {
        self.backend
            .list(self.name(), plan)
            .await
    }

    /// Returns one record, expanding the comma separated fields of `embed`.
    pub async fn show(&self, id: impl Into<Bson>, embed: Option<&str>) -> DocumentStoreResult<Record> {
        let embed = embed.map(split_list).unwrap_or_default();

        self.backend
            .show(self.name(), &id.into(), &embed)
            .await
    }

    /// Creates a record.
    pub async fn create(&self, record: Record) -> DocumentStoreResult<Record> {
        self.backend
            .create(self.name(), record)
            .await
    }

    /// Replaces (or creates) the record with the given id.
    pub async fn replace(&self, id: impl Into<Bson>, record: Record) -> DocumentStoreResult<Record> {
        self.backend
            .replace(self.name(), &id.into(), record)
            .await
    }

    /// Merges fields into the record with the given id.
    pub async fn merge(&self, id: impl Into<Bson>, partial: Record) -> DocumentStoreResult<Record> {
        self.backend
            .merge(self.name(), &id.into(), partial)
            .await
    }

    /// Deletes the record with the given id.
    pub async fn delete(&self, id: impl Into<Bson>) -> DocumentStoreResult<()> {
        self.backend
            .delete(self.name(), &id.into())
            .await
    }
}
