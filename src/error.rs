use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::rate_limit::{RateLimitDecision, now_ms};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limit exceeded. Please wait before making more changes.")]
    RateLimited(RateLimitDecision),

    #[error("{0}")]
    BadRequest(String),

    // admin database answered with an error
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Admin database unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // database refused the caller, e.g. not a super admin
            AppError::Upstream { status: 401 | 403, .. } => StatusCode::FORBIDDEN,
            AppError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::RateLimited(decision) = &self {
            let reset_in = decision.reset_in_seconds(now_ms());
            let mut response = (
                status,
                Json(serde_json::json!({
                    "error": self.to_string(),
                    "resetInSeconds": reset_in,
                })),
            )
                .into_response();

            let headers = response.headers_mut();
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_at));
            headers.insert("retry-after", HeaderValue::from(reset_in));
            return response;
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_response_carries_reset_headers() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at: now_ms() + 30_000,
        };
        let response = AppError::RateLimited(decision).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert_eq!(
            headers["x-ratelimit-reset"],
            decision.reset_at.to_string().as_str()
        );
        let retry: i64 = headers["retry-after"].to_str().unwrap().parse().unwrap();
        assert!((29..=30).contains(&retry));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let upstream = AppError::Upstream {
            status: 400,
            message: "invalid tier".into(),
        };
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.to_string(), "invalid tier");

        let refused = AppError::Upstream {
            status: 403,
            message: "permission denied".into(),
        };
        assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    }
}
