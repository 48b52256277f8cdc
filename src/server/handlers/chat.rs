//! Roleplay simulations: setup and the streaming chat endpoint.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use tracing::error;

use crate::llm::{ChatMessage, CompletionParams};
use crate::models::{Simulation, TranscriptEntry, TranscriptRole};
use crate::rate_limit::endpoints;
use crate::server::error::ApiError;
use crate::server::AppState;

use super::helpers::{authorize, consume_quota};
use super::types::{ChatRequest, CreateSimulationRequest};

/// POST /api/simulations
pub async fn create_simulation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSimulationRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.deal_id.is_empty() {
        return Err(ApiError::Validation("Missing dealId".to_string()));
    }
    state
        .deals
        .get(&request.deal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deal {}", request.deal_id)))?;

    let mut simulation = Simulation::new(request.deal_id, user_id, request.stakeholder_ids);
    simulation.meeting_goal = request.meeting_goal;
    state.simulations.save(&simulation).await?;

    Ok((StatusCode::CREATED, Json(&simulation)).into_response())
}

/// POST /api/simulation-chat
///
/// Streams the stakeholder reply as `data: {"content": ...}` SSE events.
/// One forward-and-tee stage: every delta goes to the client and into an
/// accumulator; when the upstream stream completes, the user and
/// assistant turns are appended to the stored transcript and the stream
/// is terminated with `data: [DONE]`.
pub async fn simulation_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.simulation_id.is_empty() || request.message.is_empty() {
        return Err(ApiError::Validation(
            "Missing simulationId or message".to_string(),
        ));
    }

    consume_quota(&state, &user_id, endpoints::SIMULATION_CHAT).await?;

    let simulation = state
        .simulations
        .get(&request.simulation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Simulation {}", request.simulation_id)))?;
    let existing = simulation.transcript;

    let mut messages = vec![ChatMessage::system(build_roleplay_prompt(&request))];
    for turn in &existing {
        messages.push(ChatMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        });
    }
    messages.push(ChatMessage::user(request.message.clone()));

    let mut upstream = state
        .backend
        .stream(
            messages,
            CompletionParams {
                temperature: 0.7,
                json_object: false,
            },
        )
        .await
        .map_err(ApiError::Upstream)?;

    let (tx, rx) = tokio::sync::mpsc::channel::<Bytes>(32);
    let simulations = state.simulations.clone();
    let simulation_id = request.simulation_id.clone();
    let user_message = request.message.clone();

    tokio::spawn(async move {
        let mut full_response = String::new();
        while let Some(item) = upstream.next().await {
            match item {
                Ok(content) => {
                    full_response.push_str(&content);
                    let event = format!("data: {}\n\n", json!({ "content": content }));
                    if tx.send(Bytes::from(event)).await.is_err() {
                        // Client went away; the partial turn is discarded.
                        return;
                    }
                }
                Err(e) => {
                    error!(%simulation_id, error = %e, "simulation stream failed");
                    return;
                }
            }
        }

        let mut transcript = existing;
        transcript.push(TranscriptEntry::new(TranscriptRole::User, user_message));
        transcript.push(TranscriptEntry::new(
            TranscriptRole::Assistant,
            full_response,
        ));
        if let Err(e) = simulations
            .update_transcript(&simulation_id, &transcript)
            .await
        {
            error!(%simulation_id, error = %e, "failed to persist transcript");
        }

        let _ = tx.send(Bytes::from("data: [DONE]\n\n")).await;
    });

    let body_stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|bytes| (Ok::<_, Infallible>(bytes), rx))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(body_stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn build_roleplay_prompt(request: &ChatRequest) -> String {
    let stakeholder_context = request
        .stakeholder_profiles
        .iter()
        .map(|s| {
            format!(
                "{} ({}{}):\n- Stance: {}\n- Power: {}\n- Communication Style: {}\n",
                s.name,
                s.role_title,
                s.department
                    .as_deref()
                    .map(|d| format!(", {}", d))
                    .unwrap_or_default(),
                s.stance.as_deref().unwrap_or("neutral"),
                s.power.as_deref().unwrap_or("medium"),
                s.communication_style.as_deref().unwrap_or("professional"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let goal_line = request
        .meeting_goal
        .as_deref()
        .map(|g| format!("\nUser's Meeting Goal: {}", g))
        .unwrap_or_default();

    format!(
        r#"You are roleplaying as the following stakeholder(s) in a sales meeting simulation:

{stakeholder_context}

Deal Context:
- Company: {account_name}
- Deal Value: {deal_value} {currency}
- Stage: {stage}{goal_line}

CRITICAL GUARDRAILS:
1. Stay STRICTLY within the provided deal context - do not invent information
2. Roleplay authentically based on each stakeholder's stance, power, and communication style
3. If multiple stakeholders, have them interact naturally (agreeing, disagreeing, building on each other's points)
4. Respond realistically to the user's pitch with appropriate objections, questions, or support based on stance
5. Use professional business language appropriate for enterprise sales
6. If you don't have information, say "I'd need to check on that" rather than inventing facts
7. Keep responses concise and realistic (2-4 sentences typically)

When responding:
- If positive stance: Be receptive but professional, ask good questions
- If neutral stance: Be analytical, need convincing with data/proof
- If negative stance: Express concerns professionally, need strong reassurance

Format: If simulating multiple stakeholders, prefix each response with "[Name]:". If single stakeholder, respond naturally."#,
        account_name = request.deal_context.account_name,
        deal_value = request.deal_context.deal_value,
        currency = request.deal_context.currency,
        stage = request.deal_context.stage,
    )
}
