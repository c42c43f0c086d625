//! Main document store interface.
//!
//! [`DocumentStore`] wraps a backend and hands out [`Collection`] handles.
//!
//! # Example
//!
//! ```ignore
//! use docrest::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let products = store.collection("products");
//! ```

use crate::{
    backend::StoreBackend,
    collection::Collection,
    error::DocumentStoreResult,
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets a handle on the collection with the given name.
    ///
    /// The collection is not required to exist; operations on a missing collection
    /// report [`CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound)
    /// unless the backend is configured to create it.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}
