use std::path::PathBuf;

use common::ModelFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Format '{0}' is already renderable and cannot be converted")]
    UnsupportedSource(ModelFormat),

    #[error("Reference derivative not found at {}", .0.display())]
    SampleMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion failed: {0}")]
    Failed(String),
}
