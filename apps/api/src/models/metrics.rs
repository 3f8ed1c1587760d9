use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One day of account-level metrics. `date` is the business date carried by
/// the export; `created_at` is the ingestion instant that scopes the row to
/// its upload window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OverviewRow {
    pub overview_id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub impressions: Option<i64>,
    pub likes: Option<i64>,
    pub interactions: Option<i64>,
    pub saves: Option<i64>,
    pub shares: Option<i64>,
    pub new_followers: Option<i64>,
    pub unfollows: Option<i64>,
    pub replies: Option<i64>,
    pub reposts: Option<i64>,
    pub profile_visits: Option<i64>,
    pub posts_created: Option<i64>,
    pub video_plays: Option<i64>,
    pub media_views: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// One post from a content export. `post_id` is the exporter's identifier
/// (or its time-derived fallback) and is deliberately not unique; `row_id`
/// is the surrogate key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentRow {
    pub row_id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub impressions: Option<i64>,
    pub likes: Option<i64>,
    pub interactions: Option<i64>,
    pub saves: Option<i64>,
    pub shares: Option<i64>,
    pub new_followers: Option<i64>,
    pub replies: Option<i64>,
    pub reposts: Option<i64>,
    pub profile_visits: Option<i64>,
    pub detail_expands: Option<i64>,
    pub url_clicks: Option<i64>,
    pub hashtag_clicks: Option<i64>,
    pub permalink_clicks: Option<i64>,
    pub created_at: DateTime<Utc>,
}
