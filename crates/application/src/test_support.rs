use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use pokebot_core::{AppError, AppResult};
use pokebot_domain::{OperationLogEntry, RecordKey};

use crate::{HttpRequestLabels, MetricsRecorder, MetricsSnapshot, OperationLogRepository};
use crate::{RecordStore, StoreSummary, StoredRecord};

fn lock_error<T>(error: std::sync::PoisonError<T>) -> AppError {
    AppError::Internal(format!("failed to lock test state: {error}"))
}

#[derive(Default)]
pub(crate) struct InMemoryRecordStore {
    records: Mutex<BTreeMap<RecordKey, StoredRecord>>,
    fail_writes: bool,
}

impl InMemoryRecordStore {
    pub(crate) fn failing() -> Self {
        Self {
            records: Mutex::default(),
            fail_writes: true,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append(&self, key: &RecordKey, payload: &Value) -> AppResult<()> {
        if self.fail_writes {
            return Err(AppError::Internal("disk unavailable".to_owned()));
        }

        let mut records = self.records.lock().map_err(lock_error)?;
        if records.contains_key(key) {
            return Err(AppError::Conflict(format!("record '{key}' already exists")));
        }
        records.insert(
            key.clone(),
            StoredRecord {
                key: key.clone(),
                payload: payload.clone(),
                modified_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find(&self, key: &RecordKey) -> AppResult<Option<StoredRecord>> {
        Ok(self.records.lock().map_err(lock_error)?.get(key).cloned())
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<StoredRecord>> {
        Ok(self
            .records
            .lock()
            .map_err(lock_error)?
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn summary(&self) -> AppResult<StoreSummary> {
        let records = self.records.lock().map_err(lock_error)?;
        Ok(StoreSummary {
            count: records.len(),
            latest_modified_at: records.values().map(|record| record.modified_at).max(),
        })
    }
}

#[derive(Default)]
pub(crate) struct InMemoryOperationLog {
    lines: Mutex<Vec<String>>,
    requested: Mutex<Vec<usize>>,
    fail_writes: bool,
}

impl InMemoryOperationLog {
    pub(crate) fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub(crate) fn requested_counts(&self) -> Vec<usize> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OperationLogRepository for InMemoryOperationLog {
    async fn append_entry(&self, entry: &OperationLogEntry) -> AppResult<()> {
        if self.fail_writes {
            return Err(AppError::Internal("log volume full".to_owned()));
        }
        self.lines
            .lock()
            .map_err(lock_error)?
            .push(entry.to_json_line());
        Ok(())
    }

    async fn tail_lines(&self, count: usize) -> AppResult<Vec<String>> {
        self.requested.lock().map_err(lock_error)?.push(count);
        let lines = self.lines.lock().map_err(lock_error)?;
        let start = lines.len().saturating_sub(count);
        Ok(lines[start..].to_vec())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryMetrics {
    snapshot: Mutex<MetricsSnapshot>,
}

#[async_trait]
impl MetricsRecorder for InMemoryMetrics {
    async fn record_http_request(&self, labels: HttpRequestLabels) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            snapshot.http_requests.push((labels, 1));
        }
    }

    async fn record_decision(&self) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            snapshot.decisions_total += 1;
        }
    }

    async fn record_purchase(&self, amount_usd: Option<f64>) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            snapshot.purchases_total += 1;
            snapshot.purchases_amount_usd += amount_usd.unwrap_or(0.0);
        }
    }

    async fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot
            .lock()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_default()
    }
}
