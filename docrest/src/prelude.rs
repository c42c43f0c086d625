//! Convenient re-exports of commonly used types from docrest.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docrest::prelude::*;
//! ```

pub use docrest_core::{
    collection::Collection,
    store::DocumentStore,
    document::{Record, ID_FIELD},
    backend::{StoreBackend, StoreBackendBuilder},
    config::StoreConfig,
    page::{Page, Window},
    query::{QueryParams, QueryPlan, QueryBuilder, Sort, SortDirection, FieldOp, Filter},
    snapshot::{Snapshot, SnapshotCodec, SnapshotStorage},
    validate::{Validator, ValidationIssue},
    error::{DocumentStoreError, DocumentStoreResult},
};
