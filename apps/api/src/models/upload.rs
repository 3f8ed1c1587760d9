use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One recorded ingestion. `uploaded_at` anchors the half-open window that
/// scopes this upload's rows; rows written by the same ingestion carry the
/// same instant as their `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Upload {
    pub upload_id: i64,
    pub user_id: i64,
    pub kind: String,
    pub file_name: String,
    pub rows_imported: i64,
    pub uploaded_at: DateTime<Utc>,
}
