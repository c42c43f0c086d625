//! Main docrest crate providing a unified interface to the document store.
//!
//! This crate is the primary entry point for users of docrest. It re-exports the core
//! types from the sub-crates and gives access to the storage backends and snapshot
//! storages.
//!
//! # Features
//!
//! - **Schemaless collections** - Records are ordered field maps keyed by an `id` field
//! - **Request-style queries** - `field_op=value`, `_sort`, `_order`, `_start`, `_end`, `_embed`
//! - **Foreign-key paths** - `category.name` follows `category` into `categories`
//! - **Validated mutations** - Create, replace, merge and delete through a pluggable validator
//! - **Snapshot persistence** - The whole store is flushed after every mutation
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::{prelude::*, memory::InMemoryStore, jsonfile::JsonFileStorage};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let backend = InMemoryStore::builder()
//!         .storage(JsonFileStorage::new("db.json"))
//!         .config(StoreConfig::new().create_missing_collections(true))
//!         .build()
//!         .await?;
//!     let store = DocumentStore::new(backend);
//!     let products = store.collection("products");
//!
//!     products.create(doc! { "name": "Dune", "price": 10 }).await?;
//!
//!     let page = products
//!         .list(&QueryParams::from_pairs([("price_lte", "20"), ("_sort", "name"), ("_start", "0"), ("_end", "10")]))
//!         .await?;
//!
//!     println!("{:?} of {}", page.items, page.count);
//!     for (name, value) in page.headers() {
//!         println!("{name}: {value}");
//!     }
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - The in-memory store and its in-memory snapshot storage
//! - [`jsonfile`] - Snapshot storage in a JSON file (requires the `jsonfile` feature)

pub mod prelude;

pub use docrest_core::{
    backend, collection, config, document, error, inflect, page, path, query, snapshot, store, validate,
};

// Re-export BSON and JSON types for convenience
pub use bson;
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrest_memory::{InMemoryStore, InMemoryStoreBuilder, MemorySnapshot, pipeline};
}

/// JSON file snapshot storage.
///
/// This module is only available when the `jsonfile` feature is enabled.
#[cfg(feature = "jsonfile")]
pub mod jsonfile {
    pub use docrest_jsonfile::JsonFileStorage;
}
