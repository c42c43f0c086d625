//! Error types and result types for document store operations.
//!
//! This module provides error handling for every read and mutation path of the store.
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.
//!
//! Each error maps to a transport status through [`DocumentStoreError::status_code`]
//! and to a client-facing JSON body through [`DocumentStoreError::body`].

use serde_json::{Error as SerdeJsonError, Map, Value, json};
use std::io::Error as IoError;
use thiserror::Error;

use crate::validate::ValidationIssue;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between record formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization, e.g. a snapshot that cannot be loaded.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A record with the given ID already exists in the collection.
    /// The first argument is the record ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The requested record was not found in the collection.
    /// The first argument is the record ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The record was rejected by the schema validator.
    ///
    /// Carries the validator's full issue list; the store is left untouched.
    #[error("Validation failed with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),
    /// A comparison operator was applied to a value it cannot be ordered against.
    #[error("Type mismatch on field {field}: cannot compare {found} with {operand:?}")]
    TypeMismatch {
        /// The dotted field path of the filter.
        field: String,
        /// Kind of the resolved record value.
        found: &'static str,
        /// The raw query operand.
        operand: String,
    },
    /// The query parameters could not be compiled into a plan.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Writing or reading the persistent snapshot failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl DocumentStoreError {
    /// Returns the HTTP-equivalent status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            DocumentStoreError::DocumentNotFound(..) | DocumentStoreError::CollectionNotFound(_) => 404,
            DocumentStoreError::DocumentAlreadyExists(..) => 409,
            DocumentStoreError::Validation(_)
            | DocumentStoreError::TypeMismatch { .. }
            | DocumentStoreError::InvalidQuery(_) => 400,
            DocumentStoreError::Serialization(_)
            | DocumentStoreError::Initialization(_)
            | DocumentStoreError::Persistence(_) => 500,
        }
    }

    /// Returns a structured JSON body describing this error for clients.
    pub fn body(&self) -> Value {
        match self {
            DocumentStoreError::Validation(issues) => json!(issues),
            DocumentStoreError::DocumentAlreadyExists(id, _) => json!({
                "errors": { "id": format!("ID already exists: {id}") }
            }),
            DocumentStoreError::TypeMismatch { field, .. } => {
                let mut errors = Map::new();
                errors.insert(field.clone(), Value::String(self.to_string()));

                json!({ "errors": errors })
            },
            other => json!({ "error": other.to_string() }),
        }
    }

    /// Whether this error reports a missing record or collection.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<IoError> for DocumentStoreError {
    fn from(err: IoError) -> Self {
        DocumentStoreError::Persistence(err.to_string())
    }
}
