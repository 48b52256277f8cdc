//! HTTP error taxonomy.
//!
//! Validation and auth failures reject before any side effect; quota
//! rejections carry the reset headers; model and database failures become
//! generic 500s with the detailed cause left in the server log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::analysis::AnalysisError;
use crate::auth::AuthError;
use crate::extraction::ExtractionError;
use crate::llm::LlmError;
use crate::rate_limit::RateLimitDecision;
use crate::repository::DieselError;

/// Error for all API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Bad input shape or size.
    Validation(String),
    /// Missing or invalid credential.
    Auth(AuthError),
    /// Daily quota exhausted.
    Quota(RateLimitDecision),
    /// A referenced entity does not exist.
    NotFound(String),
    /// Extraction pipeline failure.
    Extraction(ExtractionError),
    /// Analysis generator failure.
    Analysis(AnalysisError),
    /// Streaming/model failure outside the pipelines.
    Upstream(LlmError),
    /// Anything else.
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<ExtractionError> for ApiError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::NotesTooLong => Self::Validation(e.to_string()),
            ExtractionError::MeetingNotFound(id) => Self::NotFound(format!("Meeting {}", id)),
            other => Self::Extraction(other),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::DealNotFound(id) => Self::NotFound(format!("Deal {}", id)),
            AnalysisError::SimulationNotFound(id) => Self::NotFound(format!("Simulation {}", id)),
            AnalysisError::MeetingNotFound(id) => Self::NotFound(format!("Meeting {}", id)),
            other => Self::Analysis(other),
        }
    }
}

impl From<DieselError> for ApiError {
    fn from(e: DieselError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message })),
            )
                .into_response(),

            Self::Auth(e) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized", "message": e.to_string() })),
            )
                .into_response(),

            Self::Quota(decision) => quota_response(&decision),

            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{} not found", what) })),
            )
                .into_response(),

            Self::Extraction(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.public_message(), "success": false })),
            )
                .into_response(),

            Self::Analysis(e) => {
                let message = match &e {
                    AnalysisError::Llm(LlmError::RateLimited)
                    | AnalysisError::Llm(LlmError::CreditsExhausted) => e.to_string(),
                    AnalysisError::Llm(_) => "AI request failed".to_string(),
                    other => other.to_string(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }

            Self::Upstream(e) => {
                let message = match &e {
                    LlmError::RateLimited | LlmError::CreditsExhausted => e.to_string(),
                    _ => "AI request failed".to_string(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }

            Self::Internal(message) => {
                tracing::error!("internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// 429 body and headers for an exhausted quota.
fn quota_response(decision: &RateLimitDecision) -> Response {
    let retry_after = decision.retry_after_secs();
    let hours_until_reset = (retry_after + 3599) / 3600;
    let reset_at = decision.reset_at.to_rfc3339();

    let body = Json(json!({
        "error": "Rate Limit Exceeded",
        "message": format!(
            "You have reached your daily limit of {} requests for this feature. \
             Your limit will reset in {} hours at {}.",
            decision.limit, hours_until_reset, decision.reset_at.to_rfc2822(),
        ),
        "limit": decision.limit,
        "remaining": 0,
        "resetAt": reset_at,
        "retryAfter": retry_after,
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", decision.limit.into());
    headers.insert("X-RateLimit-Remaining", 0.into());
    if let Ok(value) = reset_at.parse() {
        headers.insert("X-RateLimit-Reset", value);
    }
    headers.insert("Retry-After", retry_after.into());
    response
}
