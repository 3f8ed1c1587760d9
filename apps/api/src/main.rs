mod analysis;
mod analytics;
mod auth;
mod config;
mod db;
mod errors;
mod ingest;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::provider::{AnalyzerSet, DeepSeekAnalyzer};
use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::ingest::schema::IngestRules;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pulso API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and make sure the schema exists
    let db = create_pool(&config.database_url).await?;
    init_schema(&db).await?;

    // Classifier markers and alias vocabulary for the ingestion pipeline
    let rules = Arc::new(IngestRules::default());

    // Text-analysis providers, selectable per request by model name
    let mut analyzers = AnalyzerSet::default();
    analyzers.register(Arc::new(DeepSeekAnalyzer::new(
        config.deepseek_api_key.clone(),
        config.deepseek_endpoint.clone(),
    )));
    if config.deepseek_api_key.is_none() {
        info!("DEEPSEEK_API_KEY not set; analysis endpoints will report the provider as unconfigured");
    }

    // Build app state
    let state = AppState {
        db,
        rules,
        analyzers,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
