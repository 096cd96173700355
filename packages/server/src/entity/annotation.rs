use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "annotation")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub asset_id: Uuid,
    #[sea_orm(belongs_to, from = "asset_id", to = "id")]
    pub asset: HasOne<super::asset::Entity>,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Anchor point in the asset's model space.
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,

    /// Viewpoint snapshot as `{position: [x, y, z], target: [x, y, z]}`.
    #[sea_orm(column_type = "JsonBinary")]
    pub camera_state: Option<Json>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
