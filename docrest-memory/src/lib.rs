//! In-memory document storage backend for docrest.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! Collections live in a snapshot behind an async-aware read-write lock, and every
//! committed mutation flushes the whole snapshot to a pluggable storage.
//!
//! # Features
//!
//! - **Serialized mutations** - Each write holds the lock through validation and flush
//! - **Full query support** - Filtering through foreign keys, multi-key sorting, windows, embedding
//! - **Rollback** - A failed flush leaves the in-memory state untouched
//! - **Pluggable persistence** - Any `SnapshotStorage`; [`MemorySnapshot`] keeps it in memory
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::{prelude::*, memory::{InMemoryStore, MemorySnapshot}};
//! use bson::doc;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder()
//!         .storage(MemorySnapshot::from_json(json!({ "users": [] }))?)
//!         .build()
//!         .await?;
//!     let store = DocumentStore::new(backend);
//!     let users = store.collection("users");
//!
//!     users.create(doc! { "name": "Alice" }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrest_memory;

mod evaluator;
pub mod pipeline;
pub mod snapshot;
pub mod store;

pub use snapshot::MemorySnapshot;
pub use store::{InMemoryStore, InMemoryStoreBuilder};
