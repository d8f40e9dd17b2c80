//! Durable JSON store.
//!
//! One store instance owns one on-disk JSON file holding a single aggregate.
//! Saves write the full document to a uniquely named temp sibling and rename
//! it over the target, so readers never observe a torn file. First load of a
//! missing file writes the aggregate's defaults and returns them.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Errors from store load/save operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Atomic JSON-file store for one aggregate.
pub struct JsonStore<T> {
    path: PathBuf,
    /// Serializes concurrent saves to the same file; last writer wins.
    write_lock: Mutex<()>,
    _marker: PhantomData<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the aggregate, writing defaults on first run.
    ///
    /// A corrupt file is left in place and the defaults are returned, so a
    /// bad write from an older build never bricks the engine.
    pub fn load(&self) -> Result<T, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => Ok(data),
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", self.path.display(), e);
                    Ok(T::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let defaults = T::default();
                self.write_atomic(&defaults)?;
                debug!("Initialized {} with defaults", self.path.display());
                Ok(defaults)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the aggregate. Concurrent saves to the same store are
    /// serialized; within the engine the last writer wins.
    pub async fn save(&self, data: &T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_atomic(data)
    }

    fn write_atomic(&self, data: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.temp_sibling();
        std::fs::write(&tmp, &json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_sibling(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i64,
    }

    impl Default for TestData {
        fn default() -> Self {
            Self {
                name: "fresh".to_string(),
                value: 7,
            }
        }
    }

    #[tokio::test]
    async fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store: JsonStore<TestData> = JsonStore::new(&path);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, TestData::default());
        assert!(path.exists());

        // The defaults on disk must parse back to the same value.
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, loaded);
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<TestData> = JsonStore::new(dir.path().join("data.json"));

        let data = TestData {
            name: "persisted".to_string(),
            value: 42,
        };
        store.save(&data).await.unwrap();

        assert_eq!(store.load().unwrap(), data);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("data.json");
        let store: JsonStore<TestData> = JsonStore::new(&path);

        store.save(&TestData::default()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();

        let store: JsonStore<TestData> = JsonStore::new(&path);
        assert_eq!(store.load().unwrap(), TestData::default());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<TestData> = JsonStore::new(dir.path().join("data.json"));

        for i in 0..5 {
            store
                .save(&TestData {
                    name: "x".to_string(),
                    value: i,
                })
                .await
                .unwrap();
        }

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_pretty_printed_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store: JsonStore<TestData> = JsonStore::new(&path);
        store.save(&TestData::default()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"name\""));
    }
}
