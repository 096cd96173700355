use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::AppJson;
use crate::models::annotation::{AnnotationResponse, CreateAnnotationRequest};
use crate::services::{AssetRegistry, NewAnnotation};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/annotations",
    tag = "Annotations",
    operation_id = "createAnnotation",
    summary = "Annotate a point on an asset",
    description = "Creates a note anchored at `position` in the asset's model space. \
        `cameraState` optionally records the viewpoint; `{}` is accepted.",
    request_body = CreateAnnotationRequest,
    responses(
        (status = 201, description = "Annotation created", body = AnnotationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_annotation(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAnnotationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let registry = AssetRegistry::new(&state.db);
    if registry.find(payload.asset_id).await?.is_none() {
        return Err(AppError::NotFound("Asset not found".into()));
    }

    let camera_state = payload
        .camera_state
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Failed to encode camera state: {e}")))?;

    let model = registry
        .create_annotation(NewAnnotation {
            asset_id: payload.asset_id,
            text: payload.text,
            position: [payload.position.x, payload.position.y, payload.position.z],
            camera_state,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AnnotationResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/annotations/{asset_id}",
    tag = "Annotations",
    operation_id = "listAnnotations",
    summary = "List annotations of an asset",
    description = "Returns the asset's annotations in creation order. An unknown asset yields an empty list.",
    params(("asset_id" = String, Path, description = "Asset ID (UUID)")),
    responses(
        (status = 200, description = "Annotation list", body = Vec<AnnotationResponse>),
        (status = 400, description = "Malformed asset ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_annotations(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<Json<Vec<AnnotationResponse>>, AppError> {
    let asset_id = Uuid::parse_str(&asset_id)
        .map_err(|_| AppError::Validation("Invalid asset ID".into()))?;

    let annotations = AssetRegistry::new(&state.db)
        .annotations_for(asset_id)
        .await?;

    Ok(Json(
        annotations
            .into_iter()
            .map(AnnotationResponse::from)
            .collect(),
    ))
}
