use std::sync::Arc;

use common::storage::{BlobId, BlobInfo, BlobMeta, BlobStore};
use common::{AssetStatus, ConversionJob};
use converter::ConversionEngine;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::entity::asset;
use crate::services::{AssetError, AssetRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Deleted before the job ran.
    AssetMissing,
    /// Already left `processing`, e.g. a duplicate job.
    NotProcessing(AssetStatus),
}

/// How a single conversion job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Asset moved to `ready` with this renderable blob.
    Completed { renderable_blob_id: BlobId },
    /// Asset moved to `failed` (or was already gone when the failure was recorded).
    Failed { reason: String },
    Skipped(SkipReason),
    /// The asset was deleted mid-conversion; the derivative was thrown away.
    Discarded,
}

/// Produces renderable derivatives for assets in `processing`.
pub struct ConversionPipeline {
    db: DatabaseConnection,
    blob_store: Arc<dyn BlobStore>,
    engine: Arc<dyn ConversionEngine>,
}

impl ConversionPipeline {
    pub fn new(
        db: DatabaseConnection,
        blob_store: Arc<dyn BlobStore>,
        engine: Arc<dyn ConversionEngine>,
    ) -> Self {
        Self {
            db,
            blob_store,
            engine,
        }
    }

    /// Run one job to completion. Never returns an error: every failure is
    /// recorded on the asset as `failed`.
    #[instrument(skip(self, job), fields(job_id = %job.job_id, asset_id = %job.asset_id, engine = self.engine.name()))]
    pub async fn run(&self, job: &ConversionJob) -> ConversionOutcome {
        let outcome = self.convert(job.asset_id).await;
        match &outcome {
            ConversionOutcome::Completed { renderable_blob_id } => {
                info!(%renderable_blob_id, "Conversion completed")
            }
            ConversionOutcome::Failed { reason } => warn!(%reason, "Conversion failed"),
            ConversionOutcome::Skipped(reason) => info!(?reason, "Conversion skipped"),
            ConversionOutcome::Discarded => {
                info!("Asset deleted during conversion, derivative discarded")
            }
        }
        outcome
    }

    async fn convert(&self, asset_id: Uuid) -> ConversionOutcome {
        let registry = AssetRegistry::new(&self.db);

        let asset = match registry.find(asset_id).await {
            Ok(Some(asset)) => asset,
            Ok(None) => return ConversionOutcome::Skipped(SkipReason::AssetMissing),
            Err(e) => return self.mark_failed(asset_id, e.into()).await,
        };
        if asset.status != AssetStatus::Processing {
            return ConversionOutcome::Skipped(SkipReason::NotProcessing(asset.status));
        }

        let derivative = match self.write_derivative(&asset).await {
            Ok(info) => info,
            Err(e) => return self.mark_failed(asset_id, e).await,
        };

        let committed = registry
            .transition(
                asset_id,
                AssetStatus::Processing,
                AssetStatus::Ready,
                Some(derivative.id.as_uuid()),
            )
            .await;

        match committed {
            Ok(true) => ConversionOutcome::Completed {
                renderable_blob_id: derivative.id,
            },
            Ok(false) => {
                self.discard(&derivative.id).await;
                ConversionOutcome::Discarded
            }
            Err(e) => {
                self.discard(&derivative.id).await;
                self.mark_failed(asset_id, e).await
            }
        }
    }

    /// Read the original, run the engine, and commit the result as a new blob.
    async fn write_derivative(&self, asset: &asset::Model) -> Result<BlobInfo, AssetError> {
        let original = BlobId::from_uuid(asset.original_blob_id);
        let source = self.blob_store.get(&original).await?;

        let converted = self.engine.convert(source, asset.format).await?;

        let meta = BlobMeta::new(format!(
            "converted_{}.{}",
            asset.id,
            converted.format.extension()
        ))
        .with_tag("format", converted.format.as_str())
        .with_tag("source_asset", asset.id.to_string());

        Ok(self.blob_store.put(meta, &converted.data).await?)
    }

    async fn mark_failed(&self, asset_id: Uuid, cause: AssetError) -> ConversionOutcome {
        let registry = AssetRegistry::new(&self.db);
        match registry
            .transition(asset_id, AssetStatus::Processing, AssetStatus::Failed, None)
            .await
        {
            Ok(true) => {}
            Ok(false) => info!("Asset left processing before the failure was recorded"),
            Err(e) => error!(error = %e, "Failed to record conversion failure"),
        }
        ConversionOutcome::Failed {
            reason: cause.to_string(),
        }
    }

    async fn discard(&self, blob_id: &BlobId) {
        if let Err(e) = self.blob_store.delete(blob_id).await {
            error!(%blob_id, error = %e, "Failed to delete uncommitted derivative");
        }
    }
}
