use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to produce a renderable derivative for one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Job identifier (UUID), used to correlate log lines.
    pub job_id: Uuid,
    /// Asset whose original blob should be converted.
    pub asset_id: Uuid,
    pub enqueued_at: DateTime<Utc>,
}

impl ConversionJob {
    /// Create a new job with a generated id.
    pub fn new(asset_id: Uuid) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            asset_id,
            enqueued_at: Utc::now(),
        }
    }
}
