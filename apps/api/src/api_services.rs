use std::sync::Arc;

use pokebot_application::{DecisionService, MetricsService, OperationLogService, PurchaseService};
use pokebot_core::AppError;
use pokebot_infrastructure::{FileRecordStore, InMemoryMetricsRecorder, JsonLinesOperationLog};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Wires the file-backed adapters into the services and creates every
/// storage directory. Fails when a directory cannot be created.
pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let purchase_store = FileRecordStore::new(&config.purchases_dir);
    let decision_store = FileRecordStore::new(&config.decisions_dir);
    let operation_log = JsonLinesOperationLog::in_directory(&config.logs_dir);

    purchase_store.ensure_directory().await?;
    decision_store.ensure_directory().await?;
    operation_log.ensure_directory().await?;

    info!(
        purchases_dir = %config.purchases_dir.display(),
        decisions_dir = %config.decisions_dir.display(),
        operation_log = %operation_log.path().display(),
        admin_auth = config.admin_credentials.is_some(),
        "storage ready"
    );

    let operation_log_service = OperationLogService::new(Arc::new(operation_log));
    let metrics_service = MetricsService::new(Arc::new(InMemoryMetricsRecorder::new()));

    Ok(AppState {
        purchase_service: PurchaseService::new(
            Arc::new(purchase_store),
            operation_log_service.clone(),
            metrics_service.clone(),
        ),
        decision_service: DecisionService::new(
            Arc::new(decision_store),
            operation_log_service.clone(),
            metrics_service.clone(),
        ),
        operation_log_service,
        metrics_service,
        admin_credentials: config.admin_credentials.clone().map(Arc::new),
    })
}
