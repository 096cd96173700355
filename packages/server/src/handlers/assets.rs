use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::models::asset::{AssetResponse, MessageResponse};
use crate::services::{self, AssetRegistry};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/assets",
    tag = "Assets",
    operation_id = "listAssets",
    summary = "List assets",
    description = "Returns every asset, most recent upload first.",
    responses(
        (status = 200, description = "Asset list", body = Vec<AssetResponse>),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_assets(
    State(state): State<AppState>,
) -> Result<Json<Vec<AssetResponse>>, AppError> {
    let assets = AssetRegistry::new(&state.db).list_newest_first().await?;
    Ok(Json(assets.into_iter().map(AssetResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/assets/{id}",
    tag = "Assets",
    operation_id = "getAsset",
    summary = "Get an asset",
    description = "Returns a single asset. Use this to poll the status of a conversion.",
    params(("id" = String, Path, description = "Asset ID (UUID)")),
    responses(
        (status = 200, description = "Asset", body = AssetResponse),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssetResponse>, AppError> {
    let id = parse_asset_id(&id)?;
    let asset = AssetRegistry::new(&state.db)
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset not found".into()))?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    delete,
    path = "/assets/{id}",
    tag = "Assets",
    operation_id = "deleteAsset",
    summary = "Delete an asset",
    description = "Removes the asset, its original and converted files, and all of its annotations.",
    params(("id" = String, Path, description = "Asset ID (UUID)")),
    responses(
        (status = 200, description = "Asset deleted", body = MessageResponse),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_asset_id(&id)?;
    services::delete_asset(&state.db, &*state.blob_store, id).await?;
    Ok(Json(MessageResponse {
        message: "Asset deleted successfully".into(),
    }))
}

/// A malformed id cannot name an existing asset.
fn parse_asset_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::NotFound("Asset not found".into()))
}
