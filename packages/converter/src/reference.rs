use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use common::ModelFormat;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::engine::{ConversionEngine, ConvertedModel, DerivativeFormat};
use crate::error::ConversionError;
use crate::glb;

/// Stand-in engine: waits, then returns a fixed derivative regardless of input.
#[derive(Debug, Clone)]
pub struct ReferenceEngine {
    delay: Duration,
    sample_path: Option<PathBuf>,
}

impl ReferenceEngine {
    pub fn new(delay: Duration, sample_path: Option<PathBuf>) -> Self {
        Self { delay, sample_path }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Duration::from_millis(config.delay_ms),
            config.sample_path.clone(),
        )
    }

    async fn derivative(&self) -> Result<Vec<u8>, ConversionError> {
        let Some(path) = &self.sample_path else {
            return Ok(glb::minimal_scene());
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConversionError::SampleMissing(path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        if !glb::is_glb(&bytes) {
            return Err(ConversionError::Failed(format!(
                "reference derivative at {} is not a GLB file",
                path.display()
            )));
        }
        Ok(bytes)
    }
}

#[async_trait]
impl ConversionEngine for ReferenceEngine {
    fn name(&self) -> &str {
        "reference"
    }

    #[instrument(skip(self, source), fields(source_len = source.len()))]
    async fn convert(
        &self,
        source: Vec<u8>,
        format: ModelFormat,
    ) -> Result<ConvertedModel, ConversionError> {
        if !format.requires_conversion() {
            return Err(ConversionError::UnsupportedSource(format));
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let data = self.derivative().await?;
        debug!(derivative_len = data.len(), "Reference conversion finished");

        Ok(ConvertedModel {
            data,
            format: DerivativeFormat::Glb,
        })
    }
}
