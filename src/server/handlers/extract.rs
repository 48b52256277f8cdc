//! The enrichment trigger endpoint.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::extraction::MAX_RAW_NOTES_CHARS;
use crate::rate_limit::endpoints;
use crate::server::error::ApiError;
use crate::server::AppState;

use super::helpers::{apply_rate_limit_headers, authorize, consume_quota};
use super::types::ExtractRequest;

/// POST /api/extract-meeting-intelligence
///
/// Runs the full pipeline synchronously and returns the extracted payload.
/// The meeting row ends in a terminal state either way; this response just
/// saves the caller one poll.
pub async fn extract_meeting_intelligence(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExtractRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.meeting_id.is_empty() || request.raw_notes.is_empty() {
        return Err(ApiError::Validation(
            "Missing meetingId or rawNotes".to_string(),
        ));
    }
    if request.raw_notes.chars().count() > MAX_RAW_NOTES_CHARS {
        return Err(ApiError::Validation(format!(
            "rawNotes exceeds the {} character limit",
            MAX_RAW_NOTES_CHARS
        )));
    }

    let decision = consume_quota(
        &state,
        &user_id,
        endpoints::EXTRACT_MEETING_INTELLIGENCE,
    )
    .await?;

    let extracted = state
        .pipeline
        .run(&request.meeting_id, &request.raw_notes)
        .await?;

    let mut response = Json(json!({
        "success": true,
        "extracted": extracted,
    }))
    .into_response();
    apply_rate_limit_headers(&mut response, &decision);
    Ok(response)
}
