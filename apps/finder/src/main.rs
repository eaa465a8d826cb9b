mod access;
mod catalog;
mod config;
mod db;
mod errors;
mod matching;
mod maturity;
mod models;
mod pagination;
mod routes;
mod state;
mod validation;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::matching::scoring::{MatchScorer, WeightedSkillScorer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Finder API v{}", env!("CARGO_PKG_VERSION"));

    // Connects and applies pending migrations
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    let match_scorer: Arc<dyn MatchScorer> = Arc::new(WeightedSkillScorer);
    info!(
        "Match scorer: {} (default maturity_weight {})",
        match_scorer.backend(),
        config.default_maturity_weight
    );

    let state = AppState {
        db,
        config: config.clone(),
        match_scorer,
    };

    // TODO: restrict CORS origins once the web client's domain is fixed
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
