//! Application services and ports.

#![forbid(unsafe_code)]

mod decision_service;
mod metrics_service;
mod operation_log_service;
mod purchase_service;
mod record_store_ports;

#[cfg(test)]
mod test_support;

pub use decision_service::{DECISION_LISTING_LIMIT, DecisionService, InboundOutcome};
pub use metrics_service::{HttpRequestLabels, MetricsRecorder, MetricsService, MetricsSnapshot};
pub use operation_log_service::{
    DEFAULT_TAIL_LINES, MAX_TAIL_LINES, OperationLogRepository, OperationLogService,
};
pub use purchase_service::{PURCHASE_LISTING_LIMIT, PurchaseListing, PurchaseService};
pub use record_store_ports::{RecordStore, StoreSummary, StoredRecord};
