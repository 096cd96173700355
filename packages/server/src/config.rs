use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{StorageBackend, StorageConfig};
pub use converter::EngineConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    1
}

/// Conversion pipeline configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ConversionConfig {
    /// Maximum number of conversions running at once. Default: 4.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Jobs that may wait for a free worker before ingestion blocks. Default: 64.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Re-enqueue assets left in `processing` by a previous run. Default: true.
    #[serde(default = "default_requeue_on_startup")]
    pub requeue_on_startup: bool,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_workers() -> usize {
    4
}
fn default_queue_depth() -> usize {
    64
}
fn default_requeue_on_startup() -> bool {
    true
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: default_queue_depth(),
            requeue_on_startup: default_requeue_on_startup(),
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("MODELVAULT_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://data/modelvault.db?mode=rwc")?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.path", "./data/blobs")?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., MODELVAULT__SERVER__PORT)
            .add_source(Environment::with_prefix("MODELVAULT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
