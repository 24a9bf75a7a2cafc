// The auth proxy in front of the gateway sets x-admin-user-id for signed-in
// admins. Missing or blank is rejected before the rate limiter runs.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};

use crate::error::AppError;
use crate::models::Actor;

pub const ADMIN_ID_HEADER: &str = "x-admin-user-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Actor {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let user_id = header_str(headers, ADMIN_ID_HEADER).ok_or(AppError::Unauthorized)?;

        let bearer = header_str(headers, header::AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let ip = header_str(headers, "x-forwarded-for")
            .or_else(|| header_str(headers, "x-real-ip"))
            .unwrap_or("unknown");
        let user_agent = header_str(headers, header::USER_AGENT.as_str()).unwrap_or("unknown");

        Ok(Actor {
            user_id: user_id.to_string(),
            bearer,
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Actor::from_headers(&parts.headers).inspect_err(|_| {
            tracing::warn!(path = %parts.uri.path(), "Admin request without identity");
        })
    }
}
