pub mod asset_status;
pub mod config;
pub mod conversion_job;
pub mod model_format;
pub mod storage;

pub use asset_status::AssetStatus;
pub use conversion_job::ConversionJob;
pub use model_format::ModelFormat;
