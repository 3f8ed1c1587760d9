use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::provider::DEFAULT_MODEL;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::analysis::AnalysisRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub model: String,
    pub recommendations: String,
    pub virality_score: i32,
}

/// POST /api/ai/analyze-post
///
/// Analyses are stored with the ingestion-style `created_at` stamp so they
/// share the upload-window deletion lifecycle with imported rows.
pub async fn handle_analyze_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let model_name = req.model_name.as_deref().unwrap_or(DEFAULT_MODEL);
    let analyzer = state
        .analyzers
        .get(model_name)
        .ok_or_else(|| AppError::Validation(format!("unknown model: {model_name}")))?;

    let analysis = analyzer
        .analyze(&req.content)
        .await
        .map_err(|e| AppError::Analysis(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO ai_analyses (user_id, model, recommendations, virality_score)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(analyzer.name())
    .bind(&analysis.recommendations)
    .bind(analysis.virality_score)
    .execute(&state.db)
    .await?;

    info!("Stored {} analysis for user {user_id}", analyzer.name());

    Ok(Json(AnalyzeResponse {
        model: analyzer.name().to_string(),
        recommendations: analysis.recommendations,
        virality_score: analysis.virality_score,
    }))
}

/// GET /api/ai/recommendations
///
/// The ten most recent stored analyses for the caller.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<AnalysisRecord>>, AppError> {
    Ok(Json(
        sqlx::query_as::<_, AnalysisRecord>(
            r#"
            SELECT * FROM ai_analyses
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 10
            "#,
        )
        .bind(user_id)
        .fetch_all(&state.db)
        .await?,
    ))
}
