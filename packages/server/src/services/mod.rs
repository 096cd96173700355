pub mod deletion;
pub mod error;
pub mod ingest;
pub mod registry;

pub use deletion::{DeletionReport, delete_asset};
pub use error::AssetError;
pub use ingest::IngestService;
pub use registry::{AssetRegistry, NewAnnotation, NewAsset};
