use chrono::Utc;
use common::storage::{BlobMeta, BlobStore};
use common::{AssetStatus, ConversionJob, ModelFormat};
use sea_orm::ConnectionTrait;
use tokio::io::AsyncRead;
use tracing::{error, info, instrument, warn};

use crate::conversion::ConversionQueue;
use crate::entity::asset;
use crate::utils::filename::validate_flat_filename;

use super::registry::{AssetRegistry, NewAsset};
use super::AssetError;

/// Accepts uploads: original blob first, then the registry record, then the
/// conversion job.
pub struct IngestService<'a, C: ConnectionTrait> {
    conn: &'a C,
    blob_store: &'a dyn BlobStore,
    conversions: &'a ConversionQueue,
}

impl<'a, C: ConnectionTrait> IngestService<'a, C> {
    pub fn new(
        conn: &'a C,
        blob_store: &'a dyn BlobStore,
        conversions: &'a ConversionQueue,
    ) -> Self {
        Self {
            conn,
            blob_store,
            conversions,
        }
    }

    /// Store `reader` as a new asset named `filename`.
    ///
    /// Nothing is written when the filename or its extension is rejected. On
    /// success exactly one blob and one asset row exist; on failure neither does.
    #[instrument(skip(self, reader))]
    pub async fn ingest<R>(&self, filename: &str, reader: &mut R) -> Result<asset::Model, AssetError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let filename =
            validate_flat_filename(filename).map_err(|e| AssetError::InvalidFilename(e.message()))?;
        let format = ModelFormat::from_filename(filename)
            .ok_or_else(|| AssetError::UnsupportedFormat(filename.to_string()))?;

        let meta = BlobMeta::new(filename)
            .with_tag("format", format.as_str())
            .with_tag("original_name", filename);
        let blob = self.blob_store.put_stream(meta, reader).await?;

        let status = AssetStatus::initial_for(format);
        let original_blob_id = blob.id.as_uuid();
        let new_asset = NewAsset {
            title: filename.to_string(),
            original_filename: filename.to_string(),
            format,
            file_size: blob.size as i64,
            original_blob_id,
            renderable_blob_id: (status == AssetStatus::Ready).then_some(original_blob_id),
            status,
            uploaded_at: Utc::now(),
        };

        let asset = match AssetRegistry::new(self.conn).create(new_asset).await {
            Ok(asset) => asset,
            Err(e) => {
                if let Err(cleanup) = self.blob_store.delete(&blob.id).await {
                    error!(blob_id = %blob.id, error = %cleanup, "Failed to remove blob of rejected asset");
                }
                return Err(e.into());
            }
        };

        info!(
            asset_id = %asset.id,
            format = %asset.format,
            size = asset.file_size,
            status = %asset.status,
            "Asset ingested"
        );

        if asset.status == AssetStatus::Processing {
            let job = ConversionJob::new(asset.id);
            if let Err(e) = self.conversions.submit(job).await {
                warn!(asset_id = %asset.id, error = %e, "Conversion not scheduled; asset stays processing until next startup");
            }
        }

        Ok(asset)
    }
}
