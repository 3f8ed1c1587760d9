use std::io::Write;

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::ingest::pipeline::{ingest_file, IngestReport};
use crate::ingest::schema::SchemaKind;
use crate::ingest::window::{
    delete_upload, list_uploads, preview_upload, reset_user_data, PreviewRows,
};
use crate::models::upload::Upload;
use crate::state::AppState;

/// POST /api/csv/upload
///
/// Accepts a multipart `file` field, spools it to a temporary file and runs
/// the pipeline against the spooled copy. The copy is removed when the
/// handler returns, whatever the outcome.
pub async fn handle_upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, AppError> {
    let mut spooled: Option<(String, NamedTempFile)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read uploaded file: {e}")))?;

        let mut file = NamedTempFile::new().map_err(|e| AppError::Internal(e.into()))?;
        file.write_all(&bytes)
            .map_err(|e| AppError::Internal(e.into()))?;
        spooled = Some((file_name, file));
        break;
    }

    let (file_name, file) =
        spooled.ok_or_else(|| AppError::Validation("no file field in request".to_string()))?;

    let report = ingest_file(&state.db, &state.rules, user_id, &file_name, file.path()).await?;
    Ok(Json(report))
}

/// GET /api/csv/uploads
pub async fn handle_list_uploads(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Upload>>, AppError> {
    Ok(Json(list_uploads(&state.db, user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    #[serde(default = "default_preview_kind")]
    pub kind: SchemaKind,
    #[serde(default = "default_preview_limit")]
    pub limit: i64,
}

fn default_preview_kind() -> SchemaKind {
    SchemaKind::Content
}

fn default_preview_limit() -> i64 {
    50
}

/// GET /api/csv/uploads/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(upload_id): Path<i64>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<PreviewRows>, AppError> {
    let rows = preview_upload(&state.db, user_id, upload_id, params.kind, params.limit).await?;
    Ok(Json(rows))
}

/// DELETE /api/csv/uploads/:id
pub async fn handle_delete_upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(upload_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    delete_upload(&state.db, user_id, upload_id).await?;
    Ok(Json(json!({ "deleted": upload_id })))
}

/// DELETE /api/csv/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, AppError> {
    reset_user_data(&state.db, user_id).await?;
    Ok(Json(json!({ "reset": true })))
}
