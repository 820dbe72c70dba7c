//! JSON-file key-value store.
//!
//! The whole store is one JSON object mapping keys to string values:
//!
//! ```json
//! {
//!   "@auth_token": "abc",
//!   "@restaurant_favorites": "[{\"_id\":\"r1\",\"name\":\"A\"}]"
//! }
//! ```
//!
//! Every operation re-reads the file, so edits made by another process are
//! visible on the next read. Writes go to a sibling temp file that is then
//! renamed over the original, so a reader never sees a half-written file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

type Entries = BTreeMap<String, String>;

/// Distinguishes temp files of concurrent writes within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A [`KeyValueStore`] persisted as a single JSON file.
///
/// A missing file reads as an empty store. The file and its parent
/// directories are created on the first write.
#[derive(Debug)]
pub struct FileStore {
    path: Utf8PathBuf,
    /// Serializes read-modify-write cycles within this process.
    io_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// Nothing is touched on disk until the first operation.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::trace!(path = %self.path, "Store file missing, reading as empty");
                return Ok(Entries::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|e| StoreError::corrupt(&self.path, e))
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::io(&self.path, e));
        }

        tracing::debug!(path = %self.path, keys = entries.len(), "Wrote store file");
        Ok(())
    }

    /// Returns a temp path unique to this process and write, so writers in
    /// other processes never share it.
    fn tmp_path(&self) -> Utf8PathBuf {
        let name = self.path.file_name().unwrap_or("store.json");
        let pid = std::process::id();
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.path.with_file_name(format!(".{name}.{pid}.{seq}.tmp"))
    }
}

impl KeyValueStore for FileStore {
    #[tracing::instrument(level = "trace", skip(self), fields(path = %self.path))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.read_entries().await?;
        Ok(entries.remove(key))
    }

    #[tracing::instrument(level = "trace", skip(self, value), fields(path = %self.path))]
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self.io_lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_owned(), value);
        self.write_entries(&entries).await
    }

    #[tracing::instrument(level = "trace", skip(self), fields(path = %self.path))]
    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.io_lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries).await
    }
}
