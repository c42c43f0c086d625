//! Core of an in-process JSON document store with a generic CRUD and query surface.
//!
//! This crate provides:
//!
//! - **Records** ([`document`]) - Record type and loose identifier matching
//! - **Field paths** ([`path`]) - Dotted paths with implicit foreign-key traversal
//! - **Queries** ([`query`]) - Request parameters compiled into query plans
//! - **Pages** ([`page`]) - Pagination window and list results
//! - **Snapshots** ([`snapshot`]) - Whole-store state, its JSON codec and the persistence seam
//! - **Validation** ([`validate`]) - The schema validator seam
//! - **Store backend abstraction** ([`backend`]) - The CRUD surface backends implement
//! - **Collections** ([`collection`]) and the **document store** ([`store`])
//! - **Error handling** ([`error`]) and **configuration** ([`config`])
//!
//! # Example
//!
//! ```ignore
//! use docrest::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let products = store.collection("products");
//!
//! products.create(doc! { "id": 7, "name": "Dune", "price": 10 }).await?;
//! let cheap = products.list(&QueryParams::from_pairs([("price_lte", "20")])).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrest_core;

pub mod backend;
pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod inflect;
pub mod page;
pub mod path;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod validate;
