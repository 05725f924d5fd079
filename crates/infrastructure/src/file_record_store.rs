use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pokebot_application::{RecordStore, StoreSummary, StoredRecord};
use pokebot_core::{AppError, AppResult};
use pokebot_domain::RecordKey;
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Record store keeping one pretty-printed `<key>.json` file per record in a
/// flat directory.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    directory: PathBuf,
}

struct RecordFile {
    key: RecordKey,
    path: PathBuf,
    modified_at: DateTime<Utc>,
}

impl FileRecordStore {
    /// Creates a store rooted at `directory`. Nothing is touched on disk.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the storage directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.directory.as_path()
    }

    /// Creates the storage directory and its parents when missing.
    pub async fn ensure_directory(&self) -> AppResult<()> {
        fs::create_dir_all(&self.directory).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to create storage directory '{}': {error}",
                self.directory.display()
            ))
        })
    }

    fn record_path(&self, key: &RecordKey) -> PathBuf {
        self.directory.join(key.file_name())
    }

    async fn record_files(&self) -> AppResult<Vec<RecordFile>> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.io_error("list", error)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|error| self.io_error("list", error))?
        {
            let Some(key) = entry.file_name().to_str().and_then(RecordKey::from_file_name) else {
                continue;
            };
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            files.push(RecordFile {
                key,
                path: entry.path(),
                modified_at: modified_at(metadata.modified()),
            });
        }

        files.sort_by(|left, right| {
            right
                .modified_at
                .cmp(&left.modified_at)
                .then_with(|| right.key.cmp(&left.key))
        });

        Ok(files)
    }

    fn io_error(&self, action: &str, error: std::io::Error) -> AppError {
        AppError::Internal(format!(
            "failed to {action} records in '{}': {error}",
            self.directory.display()
        ))
    }
}

fn modified_at(modified: std::io::Result<SystemTime>) -> DateTime<Utc> {
    DateTime::<Utc>::from(modified.unwrap_or(SystemTime::UNIX_EPOCH))
}

async fn read_payload(path: &Path) -> std::io::Result<Value> {
    let bytes = fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(std::io::Error::other)
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn append(&self, key: &RecordKey, payload: &Value) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(payload).map_err(|error| {
            AppError::Internal(format!("failed to serialize record '{key}': {error}"))
        })?;
        let path = self.record_path(key);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::Conflict(format!("record '{key}' already exists")));
            }
            Err(error) => return Err(self.io_error("write", error)),
        };

        let written = match file.write_all(&bytes).await {
            Ok(()) => file.sync_all().await,
            Err(error) => Err(error),
        };

        if let Err(error) = written {
            if let Err(cleanup_error) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup_error, "failed to remove partial record");
            }
            return Err(self.io_error("write", error));
        }

        Ok(())
    }

    async fn find(&self, key: &RecordKey) -> AppResult<Option<StoredRecord>> {
        let path = self.record_path(key);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error("read", error)),
        };

        let payload = read_payload(&path).await.map_err(|error| {
            AppError::Internal(format!("failed to read record '{key}': {error}"))
        })?;

        Ok(Some(StoredRecord {
            key: key.clone(),
            payload,
            modified_at: modified_at(metadata.modified()),
        }))
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<StoredRecord>> {
        let mut records = Vec::new();

        for file in self.record_files().await? {
            if records.len() >= limit {
                break;
            }

            match read_payload(&file.path).await {
                Ok(payload) => records.push(StoredRecord {
                    key: file.key,
                    payload,
                    modified_at: file.modified_at,
                }),
                Err(error) => {
                    warn!(path = %file.path.display(), %error, "skipping unreadable record");
                }
            }
        }

        Ok(records)
    }

    async fn summary(&self) -> AppResult<StoreSummary> {
        let files = self.record_files().await?;

        Ok(StoreSummary {
            count: files.len(),
            latest_modified_at: files.first().map(|file| file.modified_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use pokebot_application::RecordStore;
    use pokebot_core::AppError;
    use pokebot_domain::RecordKey;
    use serde_json::json;

    use super::FileRecordStore;

    fn key(value: &str) -> RecordKey {
        RecordKey::new(value).unwrap_or_else(|_| panic!("test"))
    }

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap_or_else(|_| panic!("test"))
    }

    #[tokio::test]
    async fn missing_directory_reads_as_empty() {
        let root = temp_dir();
        let store = FileRecordStore::new(root.path().join("never-created"));

        assert!(store.list_recent(10).await.unwrap_or_else(|_| panic!("test")).is_empty());
        assert_eq!(store.summary().await.unwrap_or_default().count, 0);
        assert_eq!(store.find(&key("abc")).await.unwrap_or_default(), None);
    }

    #[tokio::test]
    async fn appended_record_reads_back() {
        let root = temp_dir();
        let store = FileRecordStore::new(root.path());
        let payload = json!({"item": "pikachu", "qty": 1});

        assert!(store.append(&key("first"), &payload).await.is_ok());

        let found = store
            .find(&key("first"))
            .await
            .unwrap_or_else(|_| panic!("test"))
            .unwrap_or_else(|| panic!("test"));
        assert_eq!(found.payload, payload);
        assert!(root.path().join("first.json").is_file());
    }

    #[tokio::test]
    async fn records_are_immutable() {
        let root = temp_dir();
        let store = FileRecordStore::new(root.path());

        assert!(store.append(&key("token1"), &json!({"v": 1})).await.is_ok());
        let second = store.append(&key("token1"), &json!({"v": 2})).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        let kept = store.find(&key("token1")).await.unwrap_or_default();
        assert_eq!(kept.map(|record| record.payload), Some(json!({"v": 1})));
    }

    #[tokio::test]
    async fn listing_skips_foreign_and_corrupt_files() {
        let root = temp_dir();
        let store = FileRecordStore::new(root.path());

        assert!(store.append(&key("good"), &json!({"ok": true})).await.is_ok());
        assert!(std::fs::write(root.path().join("broken.json"), b"{not json").is_ok());
        assert!(std::fs::write(root.path().join("notes.txt"), b"hello").is_ok());
        assert!(std::fs::create_dir(root.path().join("nested.json")).is_ok());

        let records = store.list_recent(10).await.unwrap_or_else(|_| panic!("test"));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, key("good"));
        assert_eq!(store.summary().await.unwrap_or_default().count, 2);
    }

    #[tokio::test]
    async fn listing_respects_limit() {
        let root = temp_dir();
        let store = FileRecordStore::new(root.path());

        for index in 0..5 {
            let record_key = key(&format!("record-{index}"));
            assert!(store.append(&record_key, &json!({"index": index})).await.is_ok());
        }

        let records = store.list_recent(3).await.unwrap_or_else(|_| panic!("test"));
        assert_eq!(records.len(), 3);

        let summary = store.summary().await.unwrap_or_default();
        assert_eq!(summary.count, 5);
        assert!(summary.latest_modified_at.is_some());
    }

    #[tokio::test]
    async fn ensure_directory_creates_parents() {
        let root = temp_dir();
        let store = FileRecordStore::new(root.path().join("a").join("b"));

        assert!(store.ensure_directory().await.is_ok());
        assert!(store.directory().is_dir());
    }
}
