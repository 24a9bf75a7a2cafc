use axum::{Json, extract::State};
use std::sync::Arc;

use crate::anomaly::{AnomalyReport, Severity, detect_sense_anomalies, detect_usage_spikes};
use crate::error::AppError;
use crate::metrics::ANOMALIES_DETECTED;
use crate::models::{Actor, DetectRequest};
use crate::state::AppState;

fn record(report: &AnomalyReport) {
    for anomaly in &report.anomalies {
        let label = match anomaly.severity {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        ANOMALIES_DETECTED.with_label_values(&[label]).inc();
    }
}

// Caller supplies fresh snapshots; usage spikes first, then market failures
pub async fn detect_anomalies_handler(
    _actor: Actor,
    Json(payload): Json<DetectRequest>,
) -> Json<AnomalyReport> {
    let mut anomalies = detect_usage_spikes(&payload.workspaces);
    anomalies.extend(detect_sense_anomalies(&payload.markets));

    let report = AnomalyReport::from(anomalies);
    record(&report);
    Json(report)
}

// Dashboard poll: pulls the sense ops summary and checks job success rates
pub async fn dashboard_anomalies_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<AnomalyReport>, AppError> {
    let markets = state.rpc.sense_ops_summary(&actor).await?;
    let report = AnomalyReport::from(detect_sense_anomalies(&markets));
    record(&report);

    if report.critical > 0 {
        tracing::warn!(critical = report.critical, warning = report.warning, "Sense anomalies detected");
    }

    Ok(Json(report))
}
