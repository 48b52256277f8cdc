//! Deal creation and the stakeholder map read surface.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::{Deal, RelationshipType, StakeholderRelationship};
use crate::server::error::ApiError;
use crate::server::AppState;

use super::helpers::authorize;
use super::types::{CreateDealRequest, CreateRelationshipRequest};

/// POST /api/deals
pub async fn create_deal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateDealRequest>,
) -> Result<Response, ApiError> {
    let user_id = authorize(&state, &headers).await?;

    if request.account_name.is_empty() {
        return Err(ApiError::Validation("Missing accountName".to_string()));
    }

    let mut deal = Deal::new(
        user_id,
        request.account_name,
        request.deal_value,
        request.currency,
    );
    if let Some(stage) = request.stage {
        deal.stage = stage;
    }
    deal.expected_close_month = request.expected_close_month;
    state.deals.save(&deal).await?;

    Ok((StatusCode::CREATED, Json(&deal)).into_response())
}

/// GET /api/deals/:deal_id/stakeholders
///
/// The stakeholder map payload: every stakeholder on the deal plus the
/// relationship edges between them.
pub async fn list_deal_stakeholders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(deal_id): Path<String>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers).await?;

    state
        .deals
        .get(&deal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deal {}", deal_id)))?;

    let stakeholders = state.stakeholders.list_for_deal(&deal_id).await?;
    let relationships = state.stakeholders.relationships_for_deal(&deal_id).await?;

    Ok(Json(json!({
        "stakeholders": stakeholders,
        "relationships": relationships,
    }))
    .into_response())
}

/// POST /api/stakeholder-relationships
///
/// A user drawing an edge on the map. Unlike inferred edges these always
/// carry confidence 1.0.
pub async fn create_relationship(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateRelationshipRequest>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers).await?;

    if request.deal_id.is_empty()
        || request.from_stakeholder_id.is_empty()
        || request.to_stakeholder_id.is_empty()
    {
        return Err(ApiError::Validation(
            "Missing dealId, fromStakeholderId, or toStakeholderId".to_string(),
        ));
    }
    let relationship_type = RelationshipType::from_str(&request.relationship_type)
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Unknown relationshipType: {}",
                request.relationship_type
            ))
        })?;
    if request.from_stakeholder_id == request.to_stakeholder_id {
        return Err(ApiError::Validation(
            "A stakeholder cannot relate to themselves".to_string(),
        ));
    }

    for id in [&request.from_stakeholder_id, &request.to_stakeholder_id] {
        state
            .stakeholders
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Stakeholder {}", id)))?;
    }

    let edge = StakeholderRelationship::new(
        request.deal_id,
        request.from_stakeholder_id,
        request.to_stakeholder_id,
        relationship_type,
        1.0, // Manual = high confidence
    );
    let created = state.stakeholders.add_relationship(&edge).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(&edge)).into_response())
}
