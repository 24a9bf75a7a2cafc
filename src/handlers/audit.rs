use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Actor, AuditLogEntry, AuditQuery};
use crate::state::AppState;

pub async fn audit_log_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    let entries = state.rpc.audit_log(&actor, &query).await?;
    tracing::debug!(admin = %actor.user_id, count = entries.len(), "Fetched audit log");
    Ok(Json(entries))
}
