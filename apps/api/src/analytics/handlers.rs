use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::ingest::fields::coerce_date;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetricsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Daily account metrics trimmed to what the charts consume.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct MetricPoint {
    pub date: DateTime<Utc>,
    pub impressions: Option<i64>,
    pub likes: Option<i64>,
    pub interactions: Option<i64>,
    pub saves: Option<i64>,
    pub shares: Option<i64>,
    pub new_followers: Option<i64>,
}

/// GET /api/analytics/metrics
///
/// Optional `start_date` / `end_date` bound the business date, inclusive
/// at both ends. Unlike ingestion cells, an unreadable bound here is the
/// caller's mistake and rejects the request.
pub async fn handle_metrics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<MetricsParams>,
) -> Result<Json<Vec<MetricPoint>>, AppError> {
    let start = parse_bound(params.start_date.as_deref())?;
    let end = parse_bound(params.end_date.as_deref())?;

    let points = sqlx::query_as::<_, MetricPoint>(
        r#"
        SELECT date, impressions, likes, interactions, saves, shares, new_followers
        FROM account_overview
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR date >= $2)
          AND ($3::timestamptz IS NULL OR date <= $3)
        ORDER BY date ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(points))
}

fn parse_bound(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => coerce_date(Some(s))
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("unrecognized date: {s}"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct TopPostsParams {
    #[serde(default = "default_posts_limit")]
    pub limit: i64,
}

fn default_posts_limit() -> i64 {
    10
}

/// One post ranked by impressions for the top-posts table.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TopPost {
    pub post_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub impressions: Option<i64>,
    pub likes: Option<i64>,
    pub interactions: Option<i64>,
    pub saves: Option<i64>,
    pub shares: Option<i64>,
    pub replies: Option<i64>,
    pub reposts: Option<i64>,
    pub profile_visits: Option<i64>,
}

/// GET /api/analytics/posts
pub async fn handle_top_posts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<TopPostsParams>,
) -> Result<Json<Vec<TopPost>>, AppError> {
    let limit = params.limit.clamp(1, 100);

    let posts = sqlx::query_as::<_, TopPost>(
        r#"
        SELECT post_id, published_at, text, url, impressions, likes, interactions,
               saves, shares, replies, reposts, profile_visits
        FROM posts
        WHERE user_id = $1
        ORDER BY impressions DESC NULLS LAST
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(posts))
}
