//! HTTP API for the deal intelligence service.
//!
//! Exposes the enrichment trigger, its polling surface, prep brief and
//! debrief generation, stakeholder insight updates, and the streaming
//! simulation chat. Every paid endpoint runs the same envelope: auth
//! first, then the daily rate limit, then the model.

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::analysis::{BriefGenerator, DebriefGenerator, InsightsUpdater};
use crate::auth::{AuthGate, HttpIdentityProvider};
use crate::config::Settings;
use crate::extraction::ExtractionPipeline;
use crate::llm::{CompletionBackend, GatewayClient};
use crate::rate_limit::RateLimiter;
use crate::reconcile::Reconciler;
use crate::repository::{
    DbContext, DealRepository, MeetingRepository, SimulationRepository, StakeholderRepository,
};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub deals: Arc<DealRepository>,
    pub meetings: Arc<MeetingRepository>,
    pub stakeholders: Arc<StakeholderRepository>,
    pub simulations: Arc<SimulationRepository>,
    pub rate_limiter: Arc<RateLimiter>,
    pub auth: Arc<AuthGate>,
    pub backend: Arc<dyn CompletionBackend>,
    pub pipeline: Arc<ExtractionPipeline>,
    pub briefs: Arc<BriefGenerator>,
    pub debriefs: Arc<DebriefGenerator>,
    pub insights: Arc<InsightsUpdater>,
}

impl AppState {
    /// Wire up the full state from a database context, auth gate, and
    /// completion backend.
    pub fn new(ctx: &DbContext, auth: AuthGate, backend: Arc<dyn CompletionBackend>) -> Self {
        let meetings = ctx.meetings();
        let stakeholders = ctx.stakeholders();
        let reconciler = Reconciler::new(stakeholders.clone());
        let pipeline =
            ExtractionPipeline::new(meetings.clone(), reconciler, backend.clone());
        let briefs = BriefGenerator::new(
            ctx.deals(),
            stakeholders.clone(),
            meetings.clone(),
            backend.clone(),
        );
        let debriefs = DebriefGenerator::new(ctx.simulations(), ctx.deals(), backend.clone());
        let insights =
            InsightsUpdater::new(meetings.clone(), stakeholders.clone(), backend.clone());

        Self {
            deals: Arc::new(ctx.deals()),
            meetings: Arc::new(meetings),
            stakeholders: Arc::new(stakeholders),
            simulations: Arc::new(ctx.simulations()),
            rate_limiter: Arc::new(RateLimiter::new(ctx.usage())),
            auth: Arc::new(auth),
            backend,
            pipeline: Arc::new(pipeline),
            briefs: Arc::new(briefs),
            debriefs: Arc::new(debriefs),
            insights: Arc::new(insights),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let auth = AuthGate::new(Arc::new(HttpIdentityProvider::new(
        &settings.auth.provider_url,
        &settings.auth.service_key,
    )));
    let backend: Arc<dyn CompletionBackend> =
        Arc::new(GatewayClient::new(settings.gateway.clone()));

    let state = AppState::new(&ctx, auth, backend);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
