use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use pokebot_core::AppResult;
use pokebot_domain::RecordKey;

/// A persisted record read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Key the record is stored under.
    pub key: RecordKey,
    /// Payload exactly as written.
    pub payload: Value,
    /// Last modification time reported by the store.
    pub modified_at: DateTime<Utc>,
}

/// Count and recency of the records held by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    /// Number of records.
    pub count: usize,
    /// Modification time of the newest record.
    pub latest_modified_at: Option<DateTime<Utc>>,
}

/// Append-only record storage port.
///
/// One store holds one collection (purchases or decisions). Records are
/// immutable once written.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes a new record. Fails with `AppError::Conflict` when the key is
    /// already taken.
    async fn append(&self, key: &RecordKey, payload: &Value) -> AppResult<()>;

    /// Reads a single record.
    async fn find(&self, key: &RecordKey) -> AppResult<Option<StoredRecord>>;

    /// Lists up to `limit` records, newest first. Unreadable records are
    /// skipped and a missing collection is empty.
    async fn list_recent(&self, limit: usize) -> AppResult<Vec<StoredRecord>>;

    /// Summarizes the collection.
    async fn summary(&self) -> AppResult<StoreSummary>;
}
