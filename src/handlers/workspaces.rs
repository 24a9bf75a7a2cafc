use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics::{ADMIN_WRITES_TOTAL, RATE_LIMITED_TOTAL};
use crate::models::{Actor, SetAppRequest, SetTierRequest, WriteResponse};
use crate::rate_limit::RateLimitDecision;
use crate::state::AppState;

type RateHeaders = [(&'static str, String); 2];

// Rate limit check for admin writes, keyed by the admin's identity
fn check_rate_limit(state: &AppState, actor: &Actor) -> Result<RateLimitDecision, AppError> {
    let decision = state.rate_limiter.check(&actor.user_id);

    if !decision.allowed {
        RATE_LIMITED_TOTAL.inc();
        tracing::warn!(
            admin = %actor.user_id,
            reset_at = decision.reset_at,
            "Admin write rate limit exceeded"
        );
        return Err(AppError::RateLimited(decision));
    }

    Ok(decision)
}

fn rate_headers(decision: &RateLimitDecision) -> RateHeaders {
    [
        ("x-ratelimit-remaining", decision.remaining.to_string()),
        ("x-ratelimit-reset", decision.reset_at.to_string()),
    ]
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn set_tier_handler(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    actor: Actor,
    Json(payload): Json<SetTierRequest>,
) -> Result<(RateHeaders, Json<WriteResponse>), AppError> {
    let decision = check_rate_limit(&state, &actor)?;

    let (Some(tier), Some(reason)) = (required(payload.tier), required(payload.reason)) else {
        return Err(AppError::BadRequest(
            "Missing required fields: tier, reason".to_string(),
        ));
    };

    ADMIN_WRITES_TOTAL.with_label_values(&["set_tier"]).inc();

    let data = state
        .rpc
        .set_workspace_tier(&actor, &workspace_id, &tier, &reason)
        .await?;

    tracing::info!(admin = %actor.user_id, workspace = %workspace_id, %tier, "Workspace tier updated");

    Ok((
        rate_headers(&decision),
        Json(WriteResponse {
            success: true,
            data,
        }),
    ))
}

pub async fn set_app_handler(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    actor: Actor,
    Json(payload): Json<SetAppRequest>,
) -> Result<(RateHeaders, Json<WriteResponse>), AppError> {
    let decision = check_rate_limit(&state, &actor)?;

    let (Some(app), Some(enabled), Some(reason)) =
        (required(payload.app), payload.enabled, required(payload.reason))
    else {
        return Err(AppError::BadRequest(
            "Missing required fields: app, enabled, reason".to_string(),
        ));
    };

    ADMIN_WRITES_TOTAL.with_label_values(&["set_app"]).inc();

    let data = state
        .rpc
        .set_app_enabled(&actor, &workspace_id, &app, enabled, &reason)
        .await?;

    tracing::info!(admin = %actor.user_id, workspace = %workspace_id, %app, enabled, "App access updated");

    Ok((
        rate_headers(&decision),
        Json(WriteResponse {
            success: true,
            data,
        }),
    ))
}
