//! Model-backed analysis endpoints: prep briefs, debriefs, insight updates.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::rate_limit::endpoints;
use crate::server::error::ApiError;
use crate::server::AppState;

use super::helpers::{apply_rate_limit_headers, authorize, consume_quota};
use super::types::{BriefRequest, DebriefRequest, InsightsRequest};

/// POST /api/generate-prep-brief
pub async fn generate_prep_brief(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BriefRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.deal_id.is_empty() {
        return Err(ApiError::Validation("Missing dealId".to_string()));
    }

    let decision = consume_quota(&state, &user_id, endpoints::GENERATE_PREP_BRIEF).await?;

    let result = state.briefs.generate(&request.deal_id).await?;

    let mut response = Json(json!({
        "brief": result.brief,
        "dealInfo": {
            "account_name": result.deal.account_name,
            "deal_value": result.deal.deal_value,
            "currency": result.deal.currency,
            "stage": result.deal.stage,
            "expected_close_month": result.deal.expected_close_month,
        },
        "generatedAt": Utc::now().to_rfc3339(),
    }))
    .into_response();
    apply_rate_limit_headers(&mut response, &decision);
    Ok(response)
}

/// POST /api/generate-debrief
pub async fn generate_debrief(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DebriefRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.simulation_id.is_empty() {
        return Err(ApiError::Validation("Missing simulationId".to_string()));
    }

    let decision = consume_quota(&state, &user_id, endpoints::GENERATE_DEBRIEF).await?;

    let debrief = state.debriefs.generate(&request.simulation_id).await?;

    let mut response = Json(json!({ "debrief": debrief })).into_response();
    apply_rate_limit_headers(&mut response, &decision);
    Ok(response)
}

/// POST /api/update-stakeholder-insights
pub async fn update_stakeholder_insights(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InsightsRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.meeting_id.is_empty() || request.deal_id.is_empty() {
        return Err(ApiError::Validation(
            "Missing meetingId or dealId".to_string(),
        ));
    }

    let decision = consume_quota(&state, &user_id, endpoints::UPDATE_STAKEHOLDER_INSIGHTS).await?;

    let updates = state
        .insights
        .update(&request.meeting_id, &request.deal_id)
        .await?;

    let body = match updates {
        None => json!({
            "message": "No stakeholders to update",
            "updatedCount": 0,
            "updates": [],
        }),
        Some(updates) => json!({
            "message": "Stakeholder insights updated",
            "updatedCount": updates.len(),
            "updates": updates,
        }),
    };
    let mut response = Json(body).into_response();
    apply_rate_limit_headers(&mut response, &decision);
    Ok(response)
}
