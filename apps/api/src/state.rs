use std::sync::Arc;

use sqlx::PgPool;

use crate::analysis::provider::AnalyzerSet;
use crate::config::Config;
use crate::ingest::schema::IngestRules;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Classifier markers and field alias vocabulary. Supporting a new
    /// exporter is an edit here, not in the pipeline.
    pub rules: Arc<IngestRules>,
    /// Text-analysis providers, selectable per request by model name.
    pub analyzers: AnalyzerSet,
    pub config: Config,
}
