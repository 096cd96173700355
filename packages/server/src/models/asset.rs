use chrono::{DateTime, Utc};
use common::storage::BlobId;
use common::{AssetStatus, ModelFormat};
use serde::Serialize;

use crate::entity::asset;

/// Response DTO for a single asset.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    /// Asset ID (UUIDv7).
    #[serde(rename = "_id")]
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    #[schema(example = "bracket.step")]
    pub title: String,
    #[schema(example = "bracket.step")]
    pub original_filename: String,
    /// Size of the original upload in bytes.
    #[schema(example = 482113)]
    pub file_size: i64,
    pub format: ModelFormat,
    /// Blob ID of the uploaded bytes, fetchable via `/api/files/{id}`.
    #[schema(example = "01936f0e12347abc8000000000000002")]
    pub original_file_id: String,
    /// Blob ID the viewer should load. `null` until conversion finishes.
    pub renderable_file_id: Option<String>,
    pub status: AssetStatus,
    pub upload_date: DateTime<Utc>,
}

impl From<asset::Model> for AssetResponse {
    fn from(model: asset::Model) -> Self {
        Self {
            id: model.id.to_string(),
            title: model.title,
            original_filename: model.original_filename,
            file_size: model.file_size,
            format: model.format,
            original_file_id: BlobId::from_uuid(model.original_blob_id).to_hex(),
            renderable_file_id: model
                .renderable_blob_id
                .map(|id| BlobId::from_uuid(id).to_hex()),
            status: model.status,
            upload_date: model.uploaded_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Asset deleted successfully")]
    pub message: String,
}
