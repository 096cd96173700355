mod error;
mod hash;
mod id;
mod traits;

pub mod filesystem;
pub mod memory;

use std::sync::Arc;

pub use error::StorageError;
pub use hash::{ContentHash, ContentHasher};
pub use id::BlobId;
pub use traits::{BlobInfo, BlobMeta, BlobSink, BlobStore, BoxReader, BoxSink};

use crate::config::{StorageBackend, StorageConfig};

/// Construct the blob store selected by `config`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Filesystem => Arc::new(
            filesystem::FilesystemBlobStore::new(config.path.clone(), config.max_blob_size)
                .await?,
        ),
        StorageBackend::Memory => Arc::new(memory::MemoryBlobStore::new(config.max_blob_size)),
    };
    Ok(store)
}
