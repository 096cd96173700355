use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::entity::annotation;
use crate::error::AppError;

/// Longest annotation text accepted, in characters.
const MAX_TEXT_LEN: usize = 10_000;

/// Point in the asset's model space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Viewer camera at the time the note was written. Both fields are optional;
/// clients that did not capture a viewpoint send `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CameraState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<[f64; 3]>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnotationRequest {
    pub asset_id: Uuid,
    #[schema(example = "Wall thickness below 1mm here")]
    pub text: String,
    pub position: Vec3,
    #[serde(default)]
    pub camera_state: Option<CameraState>,
}

impl CreateAnnotationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.text.chars().count() > MAX_TEXT_LEN {
            return Err(AppError::Validation(format!(
                "Annotation text exceeds {MAX_TEXT_LEN} characters"
            )));
        }
        let Vec3 { x, y, z } = self.position;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(AppError::Validation("Position must be finite".into()));
        }
        Ok(())
    }
}

/// Response DTO for a single annotation.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub asset_id: String,
    pub text: String,
    pub position: Vec3,
    pub camera_state: Option<CameraState>,
    pub created_at: DateTime<Utc>,
}

impl From<annotation::Model> for AnnotationResponse {
    fn from(model: annotation::Model) -> Self {
        Self {
            id: model.id.to_string(),
            asset_id: model.asset_id.to_string(),
            text: model.text,
            position: Vec3 {
                x: model.position_x,
                y: model.position_y,
                z: model.position_z,
            },
            camera_state: stored_camera_state(model.id, model.camera_state),
            created_at: model.created_at,
        }
    }
}

/// Decode a stored camera state. A value that no longer matches
/// [`CameraState`] is dropped from the response and logged.
fn stored_camera_state(
    annotation_id: Uuid,
    value: Option<serde_json::Value>,
) -> Option<CameraState> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(%annotation_id, error = %e, "Stored camera state is unreadable; omitting it");
            None
        }
    }
}
