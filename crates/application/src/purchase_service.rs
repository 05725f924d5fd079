//! Purchase ingestion and listing.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

use pokebot_core::{AppError, AppResult};
use pokebot_domain::{OperationKind, OperationLogEntry, RecordKey, purchase_amount};

use crate::{MetricsService, OperationLogService, RecordStore, StoreSummary, StoredRecord};

/// Number of purchases returned by listings.
pub const PURCHASE_LISTING_LIMIT: usize = 200;

/// Purchases together with their summed amount.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseListing {
    /// Stored purchases, newest first.
    pub records: Vec<StoredRecord>,
    /// Sum of the `amount` fields of the listed purchases.
    pub total_usd: f64,
}

/// Application service for purchase events.
#[derive(Clone)]
pub struct PurchaseService {
    store: Arc<dyn RecordStore>,
    operation_log: OperationLogService,
    metrics: MetricsService,
}

impl PurchaseService {
    /// Creates a purchase service.
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

    /// Parses and persists a raw purchase event body.
    ///
    /// Any syntactically valid JSON document is accepted and stored verbatim
    /// under a fresh key. Malformed bodies are rejected before anything is
    /// written.
    pub async fn ingest(&self, body: &[u8]) -> AppResult<RecordKey> {
        let payload = match serde_json::from_slice::<Value>(body) {
            Ok(payload) => payload,
            Err(parse_error) => {
                self.operation_log
                    .record(
                        OperationLogEntry::new(OperationKind::EventRejected, false)
                            .with_field("error", parse_error.to_string()),
                    )
                    .await;
                return Err(AppError::Validation(format!(
                    "request body is not valid JSON: {parse_error}"
                )));
            }
        };

        let key = RecordKey::for_purchase(Utc::now());
        if let Err(store_error) = self.store.append(&key, &payload).await {
            error!(key = %key, error = %store_error, "failed to persist purchase");
            return Err(store_error);
        }

        let amount = purchase_amount(&payload);
        self.metrics.record_purchase(amount).await;
        self.operation_log
            .record(
                OperationLogEntry::new(OperationKind::PurchaseStore, true)
                    .with_field("id", key.as_str())
                    .with_field("order", payload.get("order").cloned().unwrap_or(Value::Null))
                    .with_field("amount", amount.unwrap_or(0.0)),
            )
            .await;
        info!(key = %key, "purchase stored");

        Ok(key)
    }

    /// Lists the most recent purchases and their amount total.
    pub async fn listing(&self) -> AppResult<PurchaseListing> {
        let records = self.store.list_recent(PURCHASE_LISTING_LIMIT).await?;
        let total_usd = records
            .iter()
            .filter_map(|record| purchase_amount(&record.payload))
            .sum();

        Ok(PurchaseListing { records, total_usd })
    }

    /// Summarizes the purchase collection.
    pub async fn summary(&self) -> AppResult<StoreSummary> {
        self.store.summary().await
    }
}
