use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::error::StorageError;
use super::hash::ContentHasher;
use super::id::BlobId;
use super::traits::{BlobInfo, BlobMeta, BlobSink, BlobStore, BoxReader, BoxSink};

struct StoredBlob {
    info: BlobInfo,
    data: Arc<Vec<u8>>,
}

/// Process-local blob store. Contents are lost when the process exits.
#[derive(Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<BlobId, StoredBlob>>,
    max_size: u64,
}

impl MemoryBlobStore {
    pub fn new(max_size: u64) -> Self {
        Self {
            blobs: Arc::new(DashMap::new()),
            max_size,
        }
    }

    /// Number of committed blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Ids of all committed blobs.
    pub fn ids(&self) -> Vec<BlobId> {
        self.blobs.iter().map(|entry| *entry.key()).collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create(&self, meta: BlobMeta) -> Result<BoxSink, StorageError> {
        Ok(Box::new(MemorySink {
            id: BlobId::generate(),
            meta,
            buf: Vec::new(),
            hasher: ContentHasher::new(),
            max_size: self.max_size,
            blobs: Arc::clone(&self.blobs),
        }))
    }

    async fn get_stream(&self, id: &BlobId) -> Result<(BlobInfo, BoxReader), StorageError> {
        let entry = self
            .blobs
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.to_hex()))?;
        let info = entry.info.clone();
        let data = Arc::clone(&entry.data);
        drop(entry);

        let reader: BoxReader = Box::new(Cursor::new(ArcBytes(data)));
        Ok((info, reader))
    }

    async fn stat(&self, id: &BlobId) -> Result<BlobInfo, StorageError> {
        self.blobs
            .get(id)
            .map(|entry| entry.info.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_hex()))
    }

    async fn delete(&self, id: &BlobId) -> Result<(), StorageError> {
        self.blobs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(id.to_hex()))
    }
}

/// Shared byte buffer that can back a `Cursor`.
struct ArcBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for ArcBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

struct MemorySink {
    id: BlobId,
    meta: BlobMeta,
    buf: Vec<u8>,
    hasher: ContentHasher,
    max_size: u64,
    blobs: Arc<DashMap<BlobId, StoredBlob>>,
}

#[async_trait]
impl BlobSink for MemorySink {
    fn id(&self) -> BlobId {
        self.id
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let total = (self.buf.len() + chunk.len()) as u64;
        if total > self.max_size {
            self.buf.clear();
            return Err(StorageError::SizeLimitExceeded {
                actual: total,
                limit: self.max_size,
            });
        }
        self.hasher.update(chunk);
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<BlobInfo, StorageError> {
        let sink = *self;
        let info = BlobInfo {
            id: sink.id,
            filename: sink.meta.filename,
            tags: sink.meta.tags,
            size: sink.buf.len() as u64,
            content_hash: sink.hasher.finalize(),
            created_at: Utc::now(),
        };
        sink.blobs.insert(
            sink.id,
            StoredBlob {
                info: info.clone(),
                data: Arc::new(sink.buf),
            },
        );
        Ok(info)
    }

    async fn abort(self: Box<Self>) {}
}
