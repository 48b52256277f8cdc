//! Meeting creation and the extraction polling surface.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::models::Meeting;
use crate::rate_limit::endpoints;
use crate::server::error::ApiError;
use crate::server::AppState;

use super::helpers::authorize;
use super::types::CreateMeetingRequest;

/// POST /api/meetings
///
/// Creates the meeting and hands the notes to the extraction pipeline as a
/// detached task. The response never waits for enrichment; the pipeline
/// owns its own status reporting and pollers watch it land.
pub async fn create_meeting(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateMeetingRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.deal_id.is_empty() || request.title.is_empty() || request.raw_notes.is_empty() {
        return Err(ApiError::Validation(
            "Missing dealId, title, or rawNotes".to_string(),
        ));
    }

    state
        .deals
        .get(&request.deal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deal {}", request.deal_id)))?;

    let meeting = Meeting::new(
        request.deal_id,
        user_id.clone(),
        request.title,
        request.channel,
        request.meeting_date,
        request.raw_notes,
    );
    state.meetings.save(&meeting).await?;

    spawn_extraction(&state, user_id, &meeting);

    Ok((StatusCode::CREATED, Json(&meeting)).into_response())
}

/// Fire-and-forget handoff to the pipeline. The spawned task runs the same
/// preconditions as the direct endpoint: the daily budget is consumed on
/// the creator's behalf, and a denial is recorded on the meeting like any
/// other terminal failure.
fn spawn_extraction(state: &AppState, user_id: String, meeting: &Meeting) {
    let limiter = state.rate_limiter.clone();
    let meetings = state.meetings.clone();
    let pipeline = state.pipeline.clone();
    let meeting_id = meeting.id.clone();
    let raw_notes = meeting.raw_notes.clone();

    tokio::spawn(async move {
        let decision = limiter
            .check_and_consume(&user_id, endpoints::EXTRACT_MEETING_INTELLIGENCE)
            .await;
        if !decision.allowed {
            let message = "Daily extraction limit reached. Please try again tomorrow.";
            if let Err(e) = meetings.mark_failed(&meeting_id, message).await {
                error!(%meeting_id, error = %e, "failed to record quota denial");
            }
            return;
        }

        // Failures are already recorded on the meeting by the pipeline.
        let _ = pipeline.run(&meeting_id, &raw_notes).await;
    });
}

/// GET /api/meetings/:meeting_id/extraction
///
/// The polling surface: status plus whatever partial results exist. Once
/// a caller observes a terminal status it is expected to stop polling.
pub async fn extraction_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(meeting_id): Path<String>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers).await?;

    let meeting = state
        .meetings
        .get(&meeting_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Meeting {}", meeting_id)))?;

    Ok(Json(json!({
        "status": meeting.extraction_status,
        "error": meeting.extraction_error,
        "stakeholders": meeting.stakeholders,
        "risks": meeting.risks,
    }))
    .into_response())
}
