//! Operation log port and application service.
//!
//! The operation log is the business-level audit trail of the receiver:
//! one JSON line per stored or rejected webhook, read back by operators
//! through the admin logs endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use pokebot_core::AppResult;
use pokebot_domain::OperationLogEntry;

/// Number of lines returned when the caller does not ask for a count.
pub const DEFAULT_TAIL_LINES: usize = 200;

/// Upper bound on the number of lines returned by a single tail.
pub const MAX_TAIL_LINES: usize = 5000;

/// Repository port for operation log persistence.
#[async_trait]
pub trait OperationLogRepository: Send + Sync {
    /// Appends one entry.
    async fn append_entry(&self, entry: &OperationLogEntry) -> AppResult<()>;

    /// Returns the last `count` raw lines, oldest first. A missing log is
    /// empty.
    async fn tail_lines(&self, count: usize) -> AppResult<Vec<String>>;
}

/// Application service for the operation log.
#[derive(Clone)]
pub struct OperationLogService {
    repository: Arc<dyn OperationLogRepository>,
}

impl OperationLogService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn OperationLogRepository>) -> Self {
        Self { repository }
    }

    /// Records an entry. Failures are reported through tracing and never
    /// surface to the caller.
    pub async fn record(&self, entry: OperationLogEntry) {
        if let Err(error) = self.repository.append_entry(&entry).await {
            warn!(kind = entry.kind().as_str(), %error, "failed to append operation log entry");
        }
    }

    /// Returns the most recent lines, oldest first.
    ///
    /// `requested` is clamped to `1..=MAX_TAIL_LINES`; `None` means
    /// [`DEFAULT_TAIL_LINES`].
    pub async fn tail(&self, requested: Option<usize>) -> AppResult<Vec<String>> {
        let count = requested
            .unwrap_or(DEFAULT_TAIL_LINES)
            .clamp(1, MAX_TAIL_LINES);
        self.repository.tail_lines(count).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pokebot_domain::{OperationKind, OperationLogEntry};

    use super::{MAX_TAIL_LINES, OperationLogService};
    use crate::test_support::InMemoryOperationLog;

    #[tokio::test]
    async fn tail_clamps_requested_count() {
        let log = Arc::new(InMemoryOperationLog::default());
        let service = OperationLogService::new(log.clone());

        for _ in 0..3 {
            service
                .record(OperationLogEntry::new(OperationKind::PurchaseStore, true))
                .await;
        }

        let zero = service.tail(Some(0)).await.unwrap_or_default();
        assert_eq!(zero.len(), 1);

        let default = service.tail(None).await.unwrap_or_default();
        assert_eq!(default.len(), 3);

        assert_eq!(log.requested_counts(), vec![1, 200]);

        let _ = service.tail(Some(usize::MAX)).await;
        assert_eq!(log.requested_counts().last().copied(), Some(MAX_TAIL_LINES));
    }

    #[tokio::test]
    async fn record_swallows_repository_failures() {
        let log = Arc::new(InMemoryOperationLog::failing());
        let service = OperationLogService::new(log);

        service
            .record(OperationLogEntry::new(OperationKind::Inbound, false))
            .await;
    }
}
