use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::{
    audit_log_handler, dashboard_anomalies_handler, detect_anomalies_handler, health_handler,
    metrics_handler, set_app_handler, set_tier_handler,
};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/admin/workspaces/{id}/tier", post(set_tier_handler))
        .route("/api/admin/workspaces/{id}/app", post(set_app_handler))
        .route("/api/admin/anomalies", get(dashboard_anomalies_handler))
        .route("/api/admin/anomalies/detect", post(detect_anomalies_handler))
        .route("/api/admin/audit", get(audit_log_handler))
        .with_state(state)
}
