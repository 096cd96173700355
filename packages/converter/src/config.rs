use std::path::PathBuf;

use serde::Deserialize;

/// Conversion engine configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Simulated processing time of the reference engine. Default: 2000.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// File returned as the derivative. When unset, a built-in GLB scene is used.
    #[serde(default)]
    pub sample_path: Option<PathBuf>,
}

fn default_delay_ms() -> u64 {
    2000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            sample_path: None,
        }
    }
}
