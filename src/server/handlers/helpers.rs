//! Handler helpers.
//!
//! Every paid endpoint runs the same envelope, in order: auth, input
//! validation, then the daily quota. Auth always precedes cost, and a
//! request that fails validation never consumes budget.

use axum::http::HeaderMap;
use axum::response::Response;

use crate::rate_limit::RateLimitDecision;
use crate::server::error::ApiError;
use crate::server::AppState;

/// Verify the caller's bearer credential.
pub async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let auth = state.auth.verify(headers).await?;
    Ok(auth.user_id)
}

/// Consume one call against the endpoint's daily budget.
pub async fn consume_quota(
    state: &AppState,
    user_id: &str,
    endpoint: &str,
) -> Result<RateLimitDecision, ApiError> {
    let decision = state.rate_limiter.check_and_consume(user_id, endpoint).await;
    if !decision.allowed {
        return Err(ApiError::Quota(decision));
    }
    Ok(decision)
}

/// Attach the rate-limit headers to a successful response.
pub fn apply_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", decision.limit.into());
    headers.insert("X-RateLimit-Remaining", decision.remaining.into());
    if let Ok(value) = decision.reset_at.to_rfc3339().parse() {
        headers.insert("X-RateLimit-Reset", value);
    }
}
