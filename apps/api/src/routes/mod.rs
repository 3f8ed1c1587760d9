pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::analysis;
use crate::analytics;
use crate::auth;
use crate::ingest;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Accounts
        .route("/api/auth/register", post(auth::handlers::handle_register))
        .route("/api/auth/login", post(auth::handlers::handle_login))
        // CSV ingestion and upload windows
        .route("/api/csv/upload", post(ingest::handlers::handle_upload))
        .route("/api/csv/uploads", get(ingest::handlers::handle_list_uploads))
        .route(
            "/api/csv/uploads/:id/preview",
            get(ingest::handlers::handle_preview),
        )
        .route(
            "/api/csv/uploads/:id",
            delete(ingest::handlers::handle_delete_upload),
        )
        .route("/api/csv/reset", delete(ingest::handlers::handle_reset))
        // Text analysis
        .route(
            "/api/ai/analyze-post",
            post(analysis::handlers::handle_analyze_post),
        )
        .route(
            "/api/ai/recommendations",
            get(analysis::handlers::handle_recommendations),
        )
        // Dashboard reads
        .route(
            "/api/analytics/metrics",
            get(analytics::handlers::handle_metrics),
        )
        .route(
            "/api/analytics/posts",
            get(analytics::handlers::handle_top_posts),
        )
        .with_state(state)
}
