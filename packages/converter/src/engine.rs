use async_trait::async_trait;
use common::ModelFormat;

use crate::error::ConversionError;

/// Format of a renderable derivative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivativeFormat {
    /// Binary glTF 2.0.
    Glb,
}

impl DerivativeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glb => "glb",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Glb => "glb",
        }
    }
}

/// Output of a successful conversion.
#[derive(Clone, Debug)]
pub struct ConvertedModel {
    pub data: Vec<u8>,
    pub format: DerivativeFormat,
}

/// Turns a model that the viewer cannot load into one it can.
///
/// Implementations must not touch the blob store or the asset registry; the
/// pipeline owns persistence.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn convert(
        &self,
        source: Vec<u8>,
        format: ModelFormat,
    ) -> Result<ConvertedModel, ConversionError>;
}
