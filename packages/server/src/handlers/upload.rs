use std::io;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::asset::AssetResponse;
use crate::services::IngestService;
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Body limit for the upload route. The file size itself is enforced by the
/// blob store's `max_blob_size`, which reports a proper validation error.
pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let max_blob_size = usize::try_from(max_blob_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max_blob_size.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Assets",
    operation_id = "uploadModel",
    summary = "Upload a 3D model",
    description = "Ingests the `file` multipart field as a new asset. STL, PLY and 3MF uploads are \
        `ready` immediately; STEP/STP uploads start in `processing` and are converted in the \
        background. Poll `GET /api/assets/{id}` for the outcome.",
    request_body(content_type = "multipart/form-data", description = "Model file in the `file` field"),
    responses(
        (status = 201, description = "Asset created", body = AssetResponse),
        (status = 400, description = "Missing file, invalid filename or too large (VALIDATION_ERROR), unsupported extension (UNSUPPORTED_FORMAT)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_model(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;

        let mut reader = StreamReader::new(Box::pin(field.map_err(io::Error::other)));

        let asset = IngestService::new(&state.db, &*state.blob_store, &state.conversions)
            .ingest(&filename, &mut reader)
            .await?;

        return Ok((StatusCode::CREATED, Json(AssetResponse::from(asset))));
    }

    Err(AppError::Validation("No file uploaded".into()))
}
