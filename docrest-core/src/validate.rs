//! Schema validation seam.
//!
//! The store never inspects schemas itself. Before committing a create, replace or merge
//! it hands the full resulting record to a [`Validator`] keyed by collection name, and
//! surfaces the returned issues untouched as [`DocumentStoreError::Validation`](crate::error::DocumentStoreError::Validation).

use serde::{Deserialize, Serialize};

use crate::document::Record;

/// A single structured validation failure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Field the issue refers to, or an empty string for whole-record issues.
    pub field: String,
    /// Human readable description.
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Schema validation capability consumed by the mutation operations.
///
/// Implementations must be pure with respect to the store: a call never observes or
/// changes stored records.
///
/// Any `Fn(&str, &Record) -> Result<(), Vec<ValidationIssue>>` closure is a validator.
///
/// # Example
///
/// ```ignore
/// use docrest::validate::{Validator, ValidationIssue};
///
/// let validator = |collection: &str, record: &Record| {
///     if collection == "products" && !record.contains_key("price") {
///         return Err(vec![ValidationIssue::new("price", "is required")]);
///     }
///     Ok(())
/// };
/// ```
pub trait Validator: Send + Sync {
    /// Validates `record` against the schema of `collection`.
    fn validate(&self, collection: &str, record: &Record) -> Result<(), Vec<ValidationIssue>>;
}

impl<F> Validator for F
where
    F: Fn(&str, &Record) -> Result<(), Vec<ValidationIssue>> + Send + Sync,
{
    fn validate(&self, collection: &str, record: &Record) -> Result<(), Vec<ValidationIssue>> {
        self(collection, record)
    }
}

/// Validator that accepts every record. Used when no schema is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, _collection: &str, _record: &Record) -> Result<(), Vec<ValidationIssue>> {
        Ok(())
    }
}
