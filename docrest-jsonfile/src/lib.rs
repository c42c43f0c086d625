//! JSON file snapshot storage for docrest.
//!
//! Persists the whole store as one JSON document, an object mapping each collection
//! name to its array of records:
//!
//! ```json
//! {
//!   "products": [
//!     { "id": 1, "name": "Dune", "createdAt": "2024-01-02T03:04:05.000Z" }
//!   ]
//! }
//! ```
//!
//! Every flush rewrites the file through a temporary sibling and a rename, so readers
//! of the file see either the previous or the new snapshot.
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::{prelude::*, jsonfile::JsonFileStorage, memory::InMemoryStore};
//!
//! let backend = InMemoryStore::builder()
//!     .storage(JsonFileStorage::new("db.json"))
//!     .build()
//!     .await?;
//! let store = DocumentStore::new(backend);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrest_jsonfile;

pub mod storage;

pub use storage::JsonFileStorage;
