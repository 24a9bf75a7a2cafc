use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::{MarketOpsSnapshot, WorkspaceUsageSnapshot};

// Who is performing an admin action, as seen by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub bearer: Option<String>, // caller's own token, forwarded to the database
    pub ip: String,
    pub user_agent: String,
}

// Tier change request body. Fields are optional so missing ones turn into
// a 400 after the rate limiter has counted the attempt.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SetTierRequest {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SetAppRequest {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DetectRequest {
    #[serde(default)]
    pub workspaces: Vec<WorkspaceUsageSnapshot>,
    #[serde(default)]
    pub markets: Vec<MarketOpsSnapshot>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuditQuery {
    pub workspace_id: Option<String>,
    pub action: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// One row of the admin audit trail
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AuditLogEntry {
    pub id: String,
    pub actor_user_id: String,
    pub actor_email: Option<String>,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub reason: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
