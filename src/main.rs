//! DealIntel - sales meeting intelligence and deal enablement service.
//!
//! Enriches free-text meeting notes into structured deal intelligence
//! (stakeholders, risks, relationships) via an external AI gateway, and
//! serves prep briefs, roleplay simulations, and debriefs on top of it.

mod analysis;
mod auth;
mod cli;
mod config;
mod extraction;
mod llm;
mod models;
mod rate_limit;
mod reconcile;
mod repository;
mod schema;
mod server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "dealintel=info"
    } else {
        "dealintel=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
