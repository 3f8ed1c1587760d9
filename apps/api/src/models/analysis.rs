use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRecord {
    pub analysis_id: i64,
    pub user_id: i64,
    pub model: String,
    pub recommendations: String,
    pub virality_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}
