//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        // Deals and the stakeholder map
        .route("/api/deals", post(handlers::create_deal))
        .route(
            "/api/deals/:deal_id/stakeholders",
            get(handlers::list_deal_stakeholders),
        )
        .route(
            "/api/stakeholder-relationships",
            post(handlers::create_relationship),
        )
        // Meetings and the enrichment polling surface
        .route("/api/meetings", post(handlers::create_meeting))
        .route(
            "/api/meetings/:meeting_id/extraction",
            get(handlers::extraction_status),
        )
        // Enrichment trigger
        .route(
            "/api/extract-meeting-intelligence",
            post(handlers::extract_meeting_intelligence),
        )
        // Model-backed analysis
        .route("/api/generate-prep-brief", post(handlers::generate_prep_brief))
        .route("/api/generate-debrief", post(handlers::generate_debrief))
        .route(
            "/api/update-stakeholder-insights",
            post(handlers::update_stakeholder_insights),
        )
        // Roleplay simulations
        .route("/api/simulations", post(handlers::create_simulation))
        .route("/api/simulation-chat", post(handlers::simulation_chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
