// Admin stored procedures, called through the PostgREST rpc surface

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

use crate::anomaly::MarketOpsSnapshot;
use crate::error::AppError;
use crate::metrics::RPC_LATENCY;
use crate::models::{Actor, AuditLogEntry, AuditQuery};

const SCHEMA: &str = "core";
const DEFAULT_AUDIT_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct AdminRpc {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Serialize)]
struct SetTierParams<'a> {
    p_workspace_id: &'a str,
    p_tier: &'a str,
    p_reason: &'a str,
    p_actor_ip: &'a str,
    p_actor_user_agent: &'a str,
}

#[derive(Serialize)]
struct SetAppParams<'a> {
    p_workspace_id: &'a str,
    p_app: &'a str,
    p_enabled: bool,
    p_reason: &'a str,
    p_actor_ip: &'a str,
    p_actor_user_agent: &'a str,
}

#[derive(Serialize)]
struct AuditParams<'a> {
    p_workspace_id: Option<&'a str>,
    p_action: Option<&'a str>,
    p_limit: u32,
    p_offset: u32,
}

impl AdminRpc {
    pub fn new(base_url: &str, service_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        // add http:// if not present
        let base_url = base_url.trim().trim_end_matches('/');
        let base_url = if base_url.starts_with("http") {
            base_url.to_string()
        } else {
            format!("http://{}", base_url)
        };

        Ok(Self {
            client,
            base_url,
            service_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<P, R>(&self, actor: &Actor, function: &str, params: &P) -> Result<R, AppError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let start = Instant::now();
        let bearer = actor.bearer.as_deref().unwrap_or(&self.service_key);

        let result = self
            .client
            .post(format!("{}/rest/v1/rpc/{}", self.base_url, function))
            .header("apikey", &self.service_key)
            .header("Content-Profile", SCHEMA)
            .header("Accept-Profile", SCHEMA)
            .bearer_auth(bearer)
            .json(params)
            .send()
            .await;

        RPC_LATENCY
            .with_label_values(&[function])
            .observe(start.elapsed().as_secs_f64());

        let res = result.map_err(|e| {
            tracing::error!(function, error = %e, "Admin RPC request failed");
            AppError::Transport(e)
        })?;

        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("{} returned {}", function, status));
            tracing::error!(function, status = status.as_u16(), %message, "Admin RPC returned an error");
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        // void functions answer with an empty body
        let body: &[u8] = if body.is_empty() { b"null" } else { &body };
        serde_json::from_slice(body).map_err(|e| {
            tracing::error!(function, error = %e, "Admin RPC response did not parse");
            AppError::Upstream {
                status: status.as_u16(),
                message: format!("Unexpected response from {}", function),
            }
        })
    }

    pub async fn set_workspace_tier(
        &self,
        actor: &Actor,
        workspace_id: &str,
        tier: &str,
        reason: &str,
    ) -> Result<serde_json::Value, AppError> {
        let params = SetTierParams {
            p_workspace_id: workspace_id,
            p_tier: tier,
            p_reason: reason,
            p_actor_ip: &actor.ip,
            p_actor_user_agent: &actor.user_agent,
        };
        self.call(actor, "admin_set_workspace_tier", &params).await
    }

    pub async fn set_app_enabled(
        &self,
        actor: &Actor,
        workspace_id: &str,
        app: &str,
        enabled: bool,
        reason: &str,
    ) -> Result<serde_json::Value, AppError> {
        let params = SetAppParams {
            p_workspace_id: workspace_id,
            p_app: app,
            p_enabled: enabled,
            p_reason: reason,
            p_actor_ip: &actor.ip,
            p_actor_user_agent: &actor.user_agent,
        };
        self.call(actor, "admin_set_app_enabled", &params).await
    }

    pub async fn sense_ops_summary(&self, actor: &Actor) -> Result<Vec<MarketOpsSnapshot>, AppError> {
        let rows: Option<Vec<MarketOpsSnapshot>> = self
            .call(actor, "admin_get_sense_ops_summary", &serde_json::json!({}))
            .await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn audit_log(&self, actor: &Actor, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AppError> {
        let params = AuditParams {
            p_workspace_id: query.workspace_id.as_deref().filter(|s| !s.is_empty()),
            p_action: query.action.as_deref().filter(|s| !s.is_empty()),
            p_limit: query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT),
            p_offset: query.offset.unwrap_or(0),
        };
        let rows: Option<Vec<AuditLogEntry>> = self.call(actor, "admin_get_audit_log", &params).await?;
        Ok(rows.unwrap_or_default())
    }
}
