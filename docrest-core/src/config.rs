//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Behavioral switches of a document store.
///
/// Deserializes from JSON with every field optional:
///
/// ```ignore
/// let config = StoreConfig::from_json_str(r#"{ "strict_operators": true }"#)?;
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Reject list parameters with an unknown operator suffix instead of ignoring them.
    pub strict_operators: bool,

    /// Assign an `id` to created records that lack one.
    pub assign_ids: bool,

    /// Let create and replace target collections that do not exist yet.
    pub create_missing_collections: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict_operators: false,
            assign_ids: true,
            create_missing_collections: false,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> DocumentStoreResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| DocumentStoreError::Initialization(format!("invalid store config: {err}")))
    }

    /// Sets whether unknown operators are rejected.
    #[must_use]
    pub const fn strict_operators(mut self, value: bool) -> Self {
        self.strict_operators = value;
        self
    }

    /// Sets whether missing ids are assigned on create.
    #[must_use]
    pub const fn assign_ids(mut self, value: bool) -> Self {
        self.assign_ids = value;
        self
    }

    /// Sets whether writes may create collections.
    #[must_use]
    pub const fn create_missing_collections(mut self, value: bool) -> Self {
        self.create_missing_collections = value;
        self
    }
}
