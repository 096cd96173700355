use chrono::{DateTime, Utc};
use common::{AssetStatus, ModelFormat};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entity::{annotation, asset};

use super::AssetError;

/// Fields of an asset record supplied by the ingestion service.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub title: String,
    pub original_filename: String,
    pub format: ModelFormat,
    pub file_size: i64,
    pub original_blob_id: Uuid,
    pub renderable_blob_id: Option<Uuid>,
    pub status: AssetStatus,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub asset_id: Uuid,
    pub text: String,
    pub position: [f64; 3],
    pub camera_state: Option<serde_json::Value>,
}

/// Durable metadata for assets and their annotations. The only writer of
/// `asset.status`.
pub struct AssetRegistry<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AssetRegistry<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new: NewAsset) -> Result<asset::Model, DbErr> {
        let model = asset::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(new.title),
            original_filename: Set(new.original_filename),
            format: Set(new.format),
            file_size: Set(new.file_size),
            original_blob_id: Set(new.original_blob_id),
            renderable_blob_id: Set(new.renderable_blob_id),
            status: Set(new.status),
            uploaded_at: Set(new.uploaded_at),
            ..Default::default()
        };
        model.insert(self.conn).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<asset::Model>, DbErr> {
        asset::Entity::find_by_id(id).one(self.conn).await
    }

    /// All assets, most recent upload first. Ties are broken by id, which is
    /// time-ordered.
    pub async fn list_newest_first(&self) -> Result<Vec<asset::Model>, DbErr> {
        asset::Entity::find()
            .order_by_desc(asset::Column::UploadedAt)
            .order_by_desc(asset::Column::Id)
            .all(self.conn)
            .await
    }

    pub async fn list_by_status(&self, status: AssetStatus) -> Result<Vec<asset::Model>, DbErr> {
        asset::Entity::find()
            .filter(asset::Column::Status.eq(status))
            .order_by_asc(asset::Column::UploadedAt)
            .all(self.conn)
            .await
    }

    /// Move an asset from `from` to `to`, setting `renderable_blob_id` in the
    /// same statement.
    ///
    /// The update only applies while the stored status still equals `from`.
    /// Returns `false` when no row matched (asset deleted, or moved on by
    /// someone else).
    pub async fn transition(
        &self,
        id: Uuid,
        from: AssetStatus,
        to: AssetStatus,
        renderable_blob_id: Option<Uuid>,
    ) -> Result<bool, AssetError> {
        if !from.can_transition_to(to) {
            return Err(AssetError::InvalidTransition { from, to });
        }

        let result = asset::Entity::update_many()
            .col_expr(asset::Column::Status, Expr::value(to))
            .col_expr(
                asset::Column::RenderableBlobId,
                Expr::value(renderable_blob_id),
            )
            .filter(asset::Column::Id.eq(id))
            .filter(asset::Column::Status.eq(from))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Delete the asset only if its status and renderable blob still match
    /// `seen`. Returns `false` when the row is gone or has changed since it
    /// was read.
    pub async fn delete_unchanged(&self, seen: &asset::Model) -> Result<bool, DbErr> {
        let renderable = match seen.renderable_blob_id {
            Some(blob_id) => asset::Column::RenderableBlobId.eq(blob_id),
            None => asset::Column::RenderableBlobId.is_null(),
        };
        let result = asset::Entity::delete_many()
            .filter(asset::Column::Id.eq(seen.id))
            .filter(asset::Column::Status.eq(seen.status))
            .filter(renderable)
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn create_annotation(
        &self,
        new: NewAnnotation,
    ) -> Result<annotation::Model, DbErr> {
        let [x, y, z] = new.position;
        let model = annotation::ActiveModel {
            id: Set(Uuid::now_v7()),
            asset_id: Set(new.asset_id),
            text: Set(new.text),
            position_x: Set(x),
            position_y: Set(y),
            position_z: Set(z),
            camera_state: Set(new.camera_state),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.insert(self.conn).await
    }

    /// Annotations on one asset in creation order.
    pub async fn annotations_for(&self, asset_id: Uuid) -> Result<Vec<annotation::Model>, DbErr> {
        annotation::Entity::find()
            .filter(annotation::Column::AssetId.eq(asset_id))
            .order_by_asc(annotation::Column::CreatedAt)
            .order_by_asc(annotation::Column::Id)
            .all(self.conn)
            .await
    }

    /// Returns the number of annotations removed.
    pub async fn delete_annotations_for(&self, asset_id: Uuid) -> Result<u64, DbErr> {
        let result = annotation::Entity::delete_many()
            .filter(annotation::Column::AssetId.eq(asset_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
