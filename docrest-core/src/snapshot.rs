//! The whole-store snapshot and its persistence seam.
//!
//! All collections are held together in one [`Snapshot`] and persisted as one JSON
//! document of the form `{"orders": [...], "products": [...]}`. There is no incremental
//! persistence: every committed mutation flushes the entire snapshot through a
//! [`SnapshotStorage`].
//!
//! [`SnapshotCodec`] converts between JSON and stored records. On decode, the configured
//! date fields (`createdAt` and `modifiedAt` by default) are parsed into
//! [`bson::DateTime`] at any nesting depth; on encode they are written back as RFC 3339
//! strings with millisecond precision.

use async_trait::async_trait;
use bson::{Bson, Document};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::fmt::Debug;

use crate::{
    document::Record,
    error::{DocumentStoreError, DocumentStoreResult},
    path::CollectionRegistry,
};

/// Field names parsed as dates unless configured otherwise.
pub const DEFAULT_DATE_FIELDS: &[&str] = &["createdAt", "modifiedAt"];

/// In-memory state of every collection.
///
/// Collections keep the order they were loaded or created in, so a load followed by a
/// flush writes them back in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    collections: Vec<(String, Vec<Record>)>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a collection.
    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert(name.into(), records);
        self
    }

    /// Names of all collections, in snapshot order.
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn collection(&self, name: &str) -> Option<&Vec<Record>> {
        self.collections
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, records)| records)
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Vec<Record>> {
        self.collections
            .iter_mut()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, records)| records)
    }

    /// Returns the collection, appending an empty one if needed.
    pub fn collection_or_create(&mut self, name: &str) -> &mut Vec<Record> {
        let index = match self.index_of(name) {
            Some(index) => index,
            None => {
                self.collections.push((name.to_string(), Vec::new()));
                self.collections.len() - 1
            },
        };

        &mut self.collections[index].1
    }

    /// Restores a collection to a previous state.
    pub fn restore_collection(&mut self, name: &str, records: Option<Vec<Record>>) {
        match records {
            Some(records) => self.insert(name.to_string(), records),
            None => self.collections.retain(|(candidate, _)| candidate != name),
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.collections.iter().position(|(candidate, _)| candidate == name)
    }

    /// Replaces a collection in place, or appends it.
    fn insert(&mut self, name: String, records: Vec<Record>) {
        match self.index_of(&name) {
            Some(index) => self.collections[index].1 = records,
            None => self.collections.push((name, records)),
        }
    }
}

impl CollectionRegistry for Snapshot {
    fn records(&self, collection: &str) -> Option<&[Record]> {
        self.collection(collection).map(Vec::as_slice)
    }
}

/// Converts snapshots and single records between JSON and stored form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotCodec {
    date_fields: Vec<String>,
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FIELDS.iter().copied())
    }
}

impl SnapshotCodec {
    /// Creates a codec parsing the given field names as dates.
    pub fn new<S: Into<String>>(date_fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            date_fields: date_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn date_fields(&self) -> &[String] {
        &self.date_fields
    }

    /// Decodes a whole snapshot.
    ///
    /// # Errors
    ///
    /// The top level must be an object of arrays of objects; anything else is a
    /// [`DocumentStoreError::Serialization`]. Top-level entries that are not arrays are
    /// skipped, matching how such entries are never served as collections.
    pub fn decode(&self, value: Value) -> DocumentStoreResult<Snapshot> {
        let Value::Object(entries) = value else {
            return Err(DocumentStoreError::Serialization("snapshot root must be an object".into()));
        };

        let mut snapshot = Snapshot::new();

        for (name, entry) in entries {
            let Value::Array(items) = entry else {
                continue;
            };

            let records = items
                .into_iter()
                .map(|item| self.decode_record(item))
                .collect::<DocumentStoreResult<Vec<_>>>()
                .map_err(|err| DocumentStoreError::Serialization(format!("collection {name}: {err}")))?;

            snapshot.insert(name, records);
        }

        Ok(snapshot)
    }

    /// Encodes a whole snapshot.
    pub fn encode(&self, snapshot: &Snapshot) -> Value {
        Value::Object(
            snapshot
                .collections
                .iter()
                .map(|(name, records)| {
                    let items = records.iter().map(|record| self.encode_record(record)).collect();
                    (name.clone(), Value::Array(items))
                })
                .collect(),
        )
    }

    /// Decodes a single JSON object into a record.
    pub fn decode_record(&self, value: Value) -> DocumentStoreResult<Record> {
        match self.decode_value(None, value) {
            Bson::Document(record) => Ok(record),
            other => Err(DocumentStoreError::Serialization(format!(
                "expected a JSON object, found {other}"
            ))),
        }
    }

    /// Encodes a single record as a JSON object.
    pub fn encode_record(&self, record: &Record) -> Value {
        Value::Object(
            record
                .iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect::<Map<_, _>>(),
        )
    }

    fn decode_value(&self, key: Option<&str>, value: Value) -> Bson {
        match value {
            Value::Null => Bson::Null,
            Value::Bool(value) => Bson::Boolean(value),
            Value::Number(number) => match number.as_i64() {
                Some(value) => Bson::Int64(value),
                None => Bson::Double(number.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(text) => {
                let is_date_field = key.is_some_and(|key| self.date_fields.iter().any(|field| field == key));

                match is_date_field.then(|| parse_date(&text)).flatten() {
                    Some(date) => Bson::DateTime(date),
                    None => Bson::String(text),
                }
            },
            Value::Array(items) => Bson::Array(
                items
                    .into_iter()
                    .map(|item| self.decode_value(None, item))
                    .collect(),
            ),
            Value::Object(entries) => {
                let mut document = Document::new();
                for (key, value) in entries {
                    let decoded = self.decode_value(Some(&key), value);
                    document.insert(key, decoded);
                }
                Bson::Document(document)
            },
        }
    }
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (as UTC midnight).
pub fn parse_date(text: &str) -> Option<bson::DateTime> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(bson::DateTime::from_chrono(date.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| bson::DateTime::from_chrono(midnight.and_utc()))
}

fn encode_value(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(value) => Value::Bool(*value),
        Bson::Int32(value) => Value::from(*value),
        Bson::Int64(value) => Value::from(*value),
        Bson::Double(value) => Number::from_f64(*value).map(Value::Number).unwrap_or(Value::Null),
        Bson::String(value) => Value::String(value.clone()),
        Bson::DateTime(value) => Value::String(
            value
                .to_chrono()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        Bson::Array(items) => Value::Array(items.iter().map(encode_value).collect()),
        Bson::Document(document) => Value::Object(
            document
                .iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect(),
        ),
        other => Value::String(other.to_string()),
    }
}

/// Persistence capability for whole-store snapshots.
///
/// Implementations decide where the snapshot lives (a file, memory, a database row).
/// The store calls [`load`](SnapshotStorage::load) once when it is built and
/// [`flush`](SnapshotStorage::flush) after every committed mutation, while holding its
/// write lock, so flushes never overlap.
#[async_trait]
pub trait SnapshotStorage: Send + Sync + Debug {
    /// Loads the persisted snapshot.
    async fn load(&self) -> DocumentStoreResult<Snapshot>;

    /// Replaces the persisted snapshot with `snapshot`.
    ///
    /// Must appear atomic to callers: after an error the previous snapshot is still
    /// the persisted one.
    async fn flush(&self, snapshot: &Snapshot) -> DocumentStoreResult<()>;
}
