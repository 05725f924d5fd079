use std::sync::Arc;

use pokebot_application::{
    DecisionService, MetricsService, OperationLogService, PurchaseService,
};

use crate::auth::AdminCredentials;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub purchase_service: PurchaseService,
    pub decision_service: DecisionService,
    pub operation_log_service: OperationLogService,
    pub metrics_service: MetricsService,
    pub admin_credentials: Option<Arc<AdminCredentials>>,
}
