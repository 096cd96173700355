use common::{AssetStatus, ModelFormat};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    pub original_filename: String,

    /// Derived from the upload's extension. Never changes.
    pub format: ModelFormat,

    /// Size of the original upload in bytes.
    pub file_size: i64,

    /// Blob holding the exact uploaded bytes.
    pub original_blob_id: Uuid,

    /// Blob the viewer should load. Equal to `original_blob_id` for natively
    /// renderable formats; NULL until conversion succeeds otherwise.
    pub renderable_blob_id: Option<Uuid>,

    pub status: AssetStatus,

    pub uploaded_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub annotations: HasMany<super::annotation::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
