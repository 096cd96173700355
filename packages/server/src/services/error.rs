use common::AssetStatus;
use common::storage::StorageError;
use converter::ConversionError;
use sea_orm::DbErr;
use thiserror::Error;

/// Failures raised by the asset services (ingest, registry, conversion, deletion).
#[derive(Debug, Error)]
pub enum AssetError {
    /// The filename's extension is not one of the accepted model formats.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    InvalidFilename(&'static str),

    /// Names what was missing, e.g. "Asset".
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: AssetStatus, to: AssetStatus },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Conversion engine error: {0}")]
    ConversionEngine(#[from] ConversionError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}
