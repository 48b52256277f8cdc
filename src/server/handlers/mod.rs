//! Request handlers.

mod analysis;
mod chat;
mod deals;
mod extract;
mod helpers;
mod meetings;
mod types;

pub use analysis::{generate_debrief, generate_prep_brief, update_stakeholder_insights};
pub use chat::{create_simulation, simulation_chat};
pub use deals::{create_deal, create_relationship, list_deal_stakeholders};
pub use extract::extract_meeting_intelligence;
pub use meetings::{create_meeting, extraction_status};

use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}
