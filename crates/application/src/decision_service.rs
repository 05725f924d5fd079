//! Decision capture from inbound email replies.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

use pokebot_core::{AppError, AppResult};
use pokebot_domain::{
    DecisionRecord, InboundEmail, InboundRejection, OperationKind, OperationLogEntry, RecordKey,
};

use crate::{MetricsService, OperationLogService, RecordStore, StoreSummary};

/// Number of decisions returned by listings.
pub const DECISION_LISTING_LIMIT: usize = 50;

/// Result of handling one inbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// A decision was parsed and stored.
    Stored(DecisionRecord),
    /// The email did not carry a usable decision.
    Rejected(InboundRejection),
}

/// Application service for approval decisions.
#[derive(Clone)]
pub struct DecisionService {
    store: Arc<dyn RecordStore>,
    operation_log: OperationLogService,
    metrics: MetricsService,
}

impl DecisionService {
    /// Creates a decision service.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        operation_log: OperationLogService,
        metrics: MetricsService,
    ) -> Self {
        Self {
            store,
            operation_log,
            metrics,
        }
    }

    /// Parses an inbound email and stores the decision it carries.
    ///
    /// Returns `AppError::Conflict` when a decision for the same token was
    /// already recorded.
    pub async fn record_inbound(&self, email: &InboundEmail) -> AppResult<InboundOutcome> {
        let record = match DecisionRecord::from_inbound(email, Utc::now()) {
            Ok(record) => record,
            Err(rejection) => {
                let mut entry = OperationLogEntry::new(OperationKind::Inbound, false)
                    .with_field("reason", rejection.reason());
                if let InboundRejection::MissingDecision { token } = &rejection {
                    entry = entry.with_field("token", token.as_str());
                }
                self.operation_log.record(entry).await;
                return Ok(InboundOutcome::Rejected(rejection));
            }
        };

        let key = record.key()?;
        let payload = serde_json::to_value(&record).map_err(|serialize_error| {
            AppError::Internal(format!("failed to serialize decision: {serialize_error}"))
        })?;

        if let Err(store_error) = self.store.append(&key, &payload).await {
            if !matches!(store_error, AppError::Conflict(_)) {
                error!(token = %key, error = %store_error, "failed to persist decision");
            }
            return Err(store_error);
        }

        self.metrics.record_decision().await;
        self.operation_log
            .record(
                OperationLogEntry::new(OperationKind::DecisionStore, true)
                    .with_field("token", record.token.as_str())
                    .with_field("decision", record.decision.as_str()),
            )
            .await;
        info!(token = %key, decision = record.decision.as_str(), "decision stored");

        Ok(InboundOutcome::Stored(record))
    }

    /// Looks up the decision for a token. Tokens that cannot name a record
    /// are treated as still pending.
    pub async fn find(&self, token: &str) -> AppResult<Option<DecisionRecord>> {
        let Ok(key) = RecordKey::new(token) else {
            return Ok(None);
        };

        let Some(stored) = self.store.find(&key).await? else {
            return Ok(None);
        };

        serde_json::from_value(stored.payload)
            .map(Some)
            .map_err(|parse_error| {
                AppError::Internal(format!("stored decision '{key}' is unreadable: {parse_error}"))
            })
    }

    /// Lists the most recent decision payloads, newest first.
    pub async fn list_recent(&self) -> AppResult<Vec<Value>> {
        Ok(self
            .store
            .list_recent(DECISION_LISTING_LIMIT)
            .await?
            .into_iter()
            .map(|record| record.payload)
            .collect())
    }

    /// Summarizes the decision collection.
    pub async fn summary(&self) -> AppResult<StoreSummary> {
        self.store.summary().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pokebot_core::AppError;
    use pokebot_domain::{Decision, InboundEmail, InboundRejection};

    use super::{DecisionService, InboundOutcome};
    use crate::test_support::{InMemoryMetrics, InMemoryOperationLog, InMemoryRecordStore};
    use crate::{MetricsService, OperationLogService};

    fn service() -> (DecisionService, Arc<InMemoryOperationLog>, MetricsService) {
        let log = Arc::new(InMemoryOperationLog::default());
        let metrics = MetricsService::new(Arc::new(InMemoryMetrics::default()));
        let service = DecisionService::new(
            Arc::new(InMemoryRecordStore::default()),
            OperationLogService::new(log.clone()),
            metrics.clone(),
        );
        (service, log, metrics)
    }

    fn reply(text: &str) -> InboundEmail {
        InboundEmail {
            from: "ops@example.com".to_owned(),
            subject: "Re: approve?".to_owned(),
            text: text.to_owned(),
            ..InboundEmail::default()
        }
    }

    #[tokio::test]
    async fn stored_decision_can_be_polled() {
        let (service, log, metrics) = service();

        let outcome = service
            .record_inbound(&reply("1\n\n> TOKEN: a1b2c3d4"))
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert!(matches!(outcome, InboundOutcome::Stored(_)));

        let found = service
            .find("a1b2c3d4")
            .await
            .unwrap_or_else(|_| panic!("test"))
            .unwrap_or_else(|| panic!("test"));
        assert_eq!(found.decision, Decision::Approve);
        assert_eq!(found.subject, "Re: approve?");

        assert_eq!(metrics.snapshot().await.decisions_total, 1);
        assert!(log.lines()[0].contains("\"type\":\"decision_store\""));
        assert_eq!(service.list_recent().await.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn rejection_is_logged_not_stored() {
        let (service, log, _) = service();

        let outcome = service
            .record_inbound(&reply("TOKEN: a1b2c3d4 maybe 1 maybe 2"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert_eq!(
            outcome,
            InboundOutcome::Rejected(InboundRejection::MissingDecision {
                token: "a1b2c3d4".to_owned()
            })
        );
        assert!(service.list_recent().await.unwrap_or_default().is_empty());
        assert!(log.lines()[0].contains("\"reason\":\"no_decision\""));
    }

    #[tokio::test]
    async fn second_decision_for_token_conflicts() {
        let (service, _, _) = service();

        assert!(service.record_inbound(&reply("TOKEN: ffff0000\n1")).await.is_ok());
        let second = service.record_inbound(&reply("TOKEN: ffff0000\n2")).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        let kept = service.find("ffff0000").await.unwrap_or_default();
        assert_eq!(kept.map(|record| record.decision), Some(Decision::Approve));
    }

    #[tokio::test]
    async fn unknown_or_unsafe_tokens_are_pending() {
        let (service, _, _) = service();

        assert_eq!(service.find("abcdef").await.unwrap_or_default(), None);
        assert_eq!(service.find("../etc/passwd").await.unwrap_or_default(), None);
    }
}
