//! Snapshot storage backed by a single JSON file.

use async_trait::async_trait;
use std::{
    fs::{self, File},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use docrest_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    snapshot::{Snapshot, SnapshotCodec, SnapshotStorage},
};

/// [`SnapshotStorage`] that reads and rewrites one JSON file.
///
/// File I/O is synchronous. The store flushes while holding its write lock, so a flush
/// blocks other operations on the same store for the duration of the write.
///
/// # Example
///
/// ```ignore
/// use docrest_jsonfile::JsonFileStorage;
/// use docrest::snapshot::SnapshotCodec;
///
/// let storage = JsonFileStorage::new("db.json")
///     .codec(SnapshotCodec::new(["createdAt", "publishedAt"]))
///     .pretty(false);
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    codec: SnapshotCodec,
    pretty: bool,
    create_if_missing: bool,
}

impl JsonFileStorage {
    /// Creates a storage for the file at `path`.
    ///
    /// Defaults: the default [`SnapshotCodec`], pretty output with two-space indentation,
    /// and an empty snapshot when the file does not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: SnapshotCodec::default(),
            pretty: true,
            create_if_missing: true,
        }
    }

    /// Sets the codec, which decides the fields parsed as dates.
    #[must_use]
    pub fn codec(mut self, codec: SnapshotCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Sets whether the file is written indented.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets whether a missing file loads as an empty snapshot instead of failing.
    #[must_use]
    pub fn create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());

        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn encode(&self, snapshot: &Snapshot) -> DocumentStoreResult<Vec<u8>> {
        let value = self.codec.encode(snapshot);
        let mut data = if self.pretty {
            serde_json::to_vec_pretty(&value)?
        } else {
            serde_json::to_vec(&value)?
        };
        data.push(b'\n');

        Ok(data)
    }

    /// Writes `data` next to the target, syncs it and renames it over the target.
    ///
    /// The temporary file is removed whenever the target is left untouched.
    fn write_atomically(&self, data: &[u8]) -> DocumentStoreResult<()> {
        let temp_path = self.temp_path();

        if let Err(err) = write_synced(&temp_path, data).and_then(|()| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        self.sync_parent()
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> DocumentStoreResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        File::open(parent)?.sync_all()?;

        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

#[async_trait]
impl SnapshotStorage for JsonFileStorage {
    async fn load(&self) -> DocumentStoreResult<Snapshot> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound && self.create_if_missing => {
                info!(path = %self.path.display(), "snapshot file missing, starting empty");
                return Ok(Snapshot::new());
            },
            Err(err) => {
                return Err(DocumentStoreError::Initialization(format!(
                    "cannot read {}: {err}",
                    self.path.display()
                )));
            },
        };

        let value = serde_json::from_slice(&data).map_err(|err| {
            DocumentStoreError::Initialization(format!("{} is not valid JSON: {err}", self.path.display()))
        })?;
        let snapshot = self.codec.decode(value)?;

        info!(
            path = %self.path.display(),
            collections = snapshot.collection_names().len(),
            "loaded snapshot file"
        );

        Ok(snapshot)
    }

    async fn flush(&self, snapshot: &Snapshot) -> DocumentStoreResult<()> {
        let data = self.encode(snapshot)?;
        self.write_atomically(&data)?;

        debug!(path = %self.path.display(), bytes = data.len(), "flushed snapshot file");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> JsonFileStorage {
        JsonFileStorage::new(dir.path().join("db.json"))
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();

        assert_eq!(storage_in(&dir).load().await.unwrap(), Snapshot::new());
    }

    #[tokio::test]
    async fn test_missing_file_fails_when_required() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir).create_if_missing(false);

        assert!(matches!(
            storage.load().await,
            Err(DocumentStoreError::Initialization(_)),
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "{ not json").unwrap();

        assert!(matches!(
            storage.load().await,
            Err(DocumentStoreError::Initialization(_)),
        ));
    }

    #[tokio::test]
    async fn test_flush_then_load_round_trips_dates() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(
            storage.path(),
            r#"{ "posts": [ { "id": 1, "title": "Hello", "createdAt": "2024-01-02T03:04:05.000Z" } ] }"#,
        )
        .unwrap();

        let snapshot = storage.load().await.unwrap();
        let post = &snapshot.collection("posts").unwrap()[0];
        assert!(matches!(post.get("createdAt"), Some(Bson::DateTime(_))));

        storage.flush(&snapshot).await.unwrap();

        let written = fs::read_to_string(storage.path()).unwrap();
        assert!(written.contains("\"createdAt\": \"2024-01-02T03:04:05.000Z\""));
        assert_eq!(storage.load().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_flush_writes_pretty_json_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let snapshot = Snapshot::new().with_collection("tags", vec![doc! { "id": 1_i64, "label": "new" }]);

        storage.flush(&snapshot).await.unwrap();

        let written = fs::read_to_string(storage.path()).unwrap();
        assert!(written.starts_with("{\n  \"tags\": [\n    {\n"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_flush_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        // the target path is a non-empty directory, so the rename fails
        let target = dir.path().join("db.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();
        let storage = JsonFileStorage::new(&target);

        assert!(matches!(
            storage.flush(&Snapshot::new()).await,
            Err(DocumentStoreError::Persistence(_)),
        ));
        assert!(!dir.path().join(".db.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_unwritable_temp_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("missing").join("db.json"));

        assert!(matches!(
            storage.flush(&Snapshot::new()).await,
            Err(DocumentStoreError::Persistence(_)),
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_compact_output() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir).pretty(false);
        let snapshot = Snapshot::new().with_collection("tags", vec![doc! { "id": 1_i64 }]);

        storage.flush(&snapshot).await.unwrap();

        assert_eq!(fs::read_to_string(storage.path()).unwrap(), "{\"tags\":[{\"id\":1}]}\n");
    }
}
