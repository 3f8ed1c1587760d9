use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::errors::AppError;
use crate::ingest::schema::SchemaKind;
use crate::models::metrics::{ContentRow, OverviewRow};
use crate::models::upload::Upload;

/// Hard cap on preview page size.
pub const MAX_PREVIEW_ROWS: i64 = 200;

/// Half-open interval `[start, end)` over row-creation timestamps. `end` is
/// absent for the user's most recent upload, whose window stays open until
/// the next ingestion.
///
/// Uploads do not record row ids; this derived interval is the only link
/// between an upload and its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl UploadWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at < end)
    }
}

/// Rows produced by a preview, shaped by the requested schema kind.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PreviewRows {
    Overview(Vec<OverviewRow>),
    Content(Vec<ContentRow>),
}

/// Returns the user's uploads, most recent first.
pub async fn list_uploads(pool: &PgPool, user_id: i64) -> Result<Vec<Upload>, AppError> {
    Ok(sqlx::query_as::<_, Upload>(
        "SELECT * FROM csv_uploads WHERE user_id = $1 ORDER BY uploaded_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Returns up to `limit` of the upload's rows, oldest first, ties broken by
/// insertion order.
///
/// An id the user does not own reads as not-found, exactly like an id that
/// does not exist, so the endpoint confirms nothing about other accounts.
/// Window resolution and the row read share one transaction; an ingestion
/// committing in between cannot silently shrink the window mid-request.
pub async fn preview_upload(
    pool: &PgPool,
    user_id: i64,
    upload_id: i64,
    kind: SchemaKind,
    limit: i64,
) -> Result<PreviewRows, AppError> {
    let limit = limit.clamp(1, MAX_PREVIEW_ROWS);

    let mut tx = pool.begin().await?;
    let upload = owned_upload(&mut tx, user_id, upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("upload {upload_id} not found")))?;
    let window = window_of(&mut tx, &upload).await?;

    let rows = match kind {
        SchemaKind::Overview => PreviewRows::Overview(
            sqlx::query_as::<_, OverviewRow>(
                r#"
                SELECT * FROM account_overview
                WHERE user_id = $1
                  AND created_at >= $2
                  AND ($3::timestamptz IS NULL OR created_at < $3)
                ORDER BY created_at ASC, overview_id ASC
                LIMIT $4
                "#,
            )
            .bind(user_id)
            .bind(window.start)
            .bind(window.end)
            .bind(limit)
            .fetch_all(&mut *tx)
            .await?,
        ),
        SchemaKind::Content => PreviewRows::Content(
            sqlx::query_as::<_, ContentRow>(
                r#"
                SELECT * FROM posts
                WHERE user_id = $1
                  AND created_at >= $2
                  AND ($3::timestamptz IS NULL OR created_at < $3)
                ORDER BY created_at ASC, row_id ASC
                LIMIT $4
                "#,
            )
            .bind(user_id)
            .bind(window.start)
            .bind(window.end)
            .bind(limit)
            .fetch_all(&mut *tx)
            .await?,
        ),
    };
    tx.commit().await?;

    Ok(rows)
}

/// Deletes everything the upload's window covers, then the upload record,
/// in one transaction. Rows of both kinds and stored analyses go together;
/// the window is time-based, not kind-based.
pub async fn delete_upload(pool: &PgPool, user_id: i64, upload_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let upload = owned_upload(&mut tx, user_id, upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("upload {upload_id} not found")))?;
    let window = window_of(&mut tx, &upload).await?;

    // Window rows first, the upload record last
    for table in ["ai_analyses", "posts", "account_overview"] {
        let query = format!(
            r#"
            DELETE FROM {table}
            WHERE user_id = $1
              AND created_at >= $2
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
        );
        sqlx::query(&query)
            .bind(user_id)
            .bind(window.start)
            .bind(window.end)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM csv_uploads WHERE upload_id = $1")
        .bind(upload_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Deleted upload {upload_id} and its window for user {user_id}");
    Ok(())
}

/// Unconditionally wipes every imported row and stored analysis for the
/// user, ignoring windows. Upload records stay as history. Safe to repeat;
/// a second call deletes nothing and still succeeds.
pub async fn reset_user_data(pool: &PgPool, user_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for table in ["ai_analyses", "posts", "account_overview"] {
        let query = format!("DELETE FROM {table} WHERE user_id = $1");
        sqlx::query(&query).bind(user_id).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!("Reset all imported data for user {user_id}");
    Ok(())
}

async fn owned_upload(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    upload_id: i64,
) -> Result<Option<Upload>, sqlx::Error> {
    sqlx::query_as::<_, Upload>(
        "SELECT * FROM csv_uploads WHERE upload_id = $1 AND user_id = $2",
    )
    .bind(upload_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
}

/// The window ends at the user's next upload by `uploaded_at`, or never.
async fn window_of(
    tx: &mut Transaction<'_, Postgres>,
    upload: &Upload,
) -> Result<UploadWindow, sqlx::Error> {
    let next: Option<DateTime<Utc>> = sqlx::query_scalar(
        r#"
        SELECT uploaded_at FROM csv_uploads
        WHERE user_id = $1 AND uploaded_at > $2
        ORDER BY uploaded_at ASC
        LIMIT 1
        "#,
    )
    .bind(upload.user_id)
    .bind(upload.uploaded_at)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(UploadWindow {
        start: upload.uploaded_at,
        end: next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn minute(m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, m, 0).unwrap()
    }

    #[test]
    fn test_bounded_window_selects_only_its_rows() {
        // Two uploads at 10:10 and 10:20, rows stamped at 10:12 and 10:22.
        let first = UploadWindow {
            start: minute(10),
            end: Some(minute(20)),
        };
        assert!(first.contains(minute(12)));
        assert!(!first.contains(minute(22)));
    }

    #[test]
    fn test_window_start_is_inclusive_end_exclusive() {
        let window = UploadWindow {
            start: minute(10),
            end: Some(minute(20)),
        };
        assert!(window.contains(minute(10)));
        assert!(!window.contains(minute(20)));
        assert!(!window.contains(minute(9)));
    }

    #[test]
    fn test_latest_window_is_open_ended() {
        let latest = UploadWindow {
            start: minute(20),
            end: None,
        };
        assert!(latest.contains(minute(22)));
        assert!(latest.contains(minute(59)));
        assert!(!latest.contains(minute(19)));
    }
}
