use common::{AssetStatus, ConversionJob};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::services::{AssetError, AssetRegistry};

use super::ConversionQueue;

/// Re-enqueue every asset still in `processing`.
///
/// The queue lives in memory, so jobs pending when the process stopped are
/// lost; this puts them back. Returns the number of jobs submitted.
pub async fn requeue_processing(
    db: &DatabaseConnection,
    queue: &ConversionQueue,
) -> Result<usize, AssetError> {
    let stranded = AssetRegistry::new(db)
        .list_by_status(AssetStatus::Processing)
        .await?;

    if stranded.is_empty() {
        return Ok(0);
    }

    info!(count = stranded.len(), "Requeueing assets left in processing");

    let mut submitted = 0;
    for asset in stranded {
        if let Err(e) = queue.submit(ConversionJob::new(asset.id)).await {
            warn!(asset_id = %asset.id, error = %e, "Could not requeue asset");
            break;
        }
        submitted += 1;
    }

    Ok(submitted)
}
