use common::storage::{BlobId, BlobStore, StorageError};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::entity::asset;

use super::registry::AssetRegistry;
use super::AssetError;

/// What a completed deletion removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub asset_id: Uuid,
    pub blobs_deleted: usize,
    /// Blobs that were already gone from the store.
    pub blobs_missing: usize,
    pub annotations_deleted: u64,
}

/// Remove an asset together with its blobs and annotations.
///
/// The registry rows go first, so a conversion still running for the asset
/// can no longer commit and discards its own derivative. Blob removal is
/// best-effort: store failures are logged and do not fail the deletion. Only
/// a missing asset aborts, and then nothing is touched.
#[instrument(skip(db, blob_store))]
pub async fn delete_asset(
    db: &DatabaseConnection,
    blob_store: &dyn BlobStore,
    asset_id: Uuid,
) -> Result<DeletionReport, AssetError> {
    let (asset, annotations_deleted) = remove_records(db, asset_id).await?;

    let mut blobs = vec![asset.original_blob_id];
    if let Some(renderable) = asset.renderable_blob_id
        && renderable != asset.original_blob_id
    {
        blobs.push(renderable);
    }

    let mut report = DeletionReport {
        asset_id,
        blobs_deleted: 0,
        blobs_missing: 0,
        annotations_deleted,
    };

    for blob in blobs {
        let blob_id = BlobId::from_uuid(blob);
        match blob_store.delete(&blob_id).await {
            Ok(()) => report.blobs_deleted += 1,
            Err(StorageError::NotFound(_)) => {
                warn!(%blob_id, "Blob already absent during asset deletion");
                report.blobs_missing += 1;
            }
            Err(e) => error!(%blob_id, error = %e, "Failed to delete blob; continuing"),
        }
    }

    info!(
        blobs_deleted = report.blobs_deleted,
        blobs_missing = report.blobs_missing,
        annotations_deleted = report.annotations_deleted,
        "Asset deleted"
    );

    Ok(report)
}

/// Delete the asset row and its annotations, returning the record as it was
/// when removed.
///
/// A conversion may move the asset to `ready` between the read and the
/// delete. The delete is conditional on the record read, so in that case the
/// transaction is rolled back and the fresh record is used instead. Status
/// only moves forward, so this settles after at most one retry per
/// transition.
async fn remove_records(
    db: &DatabaseConnection,
    asset_id: Uuid,
) -> Result<(asset::Model, u64), AssetError> {
    loop {
        let asset = AssetRegistry::new(db)
            .find(asset_id)
            .await?
            .ok_or(AssetError::NotFound("Asset"))?;

        let txn = db.begin().await?;
        let registry = AssetRegistry::new(&txn);
        let annotations_deleted = registry.delete_annotations_for(asset_id).await?;
        if registry.delete_unchanged(&asset).await? {
            txn.commit().await?;
            return Ok((asset, annotations_deleted));
        }
        txn.rollback().await?;
        debug!(status = %asset.status, "Asset changed while deleting; re-reading");
    }
}
