use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::hash::ContentHash;
use super::id::BlobId;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Type alias for a boxed, not yet committed blob write.
pub type BoxSink = Box<dyn BlobSink>;

/// Metadata supplied when a blob write is opened.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMeta {
    /// Logical filename (used for content type and download names).
    pub filename: String,
    /// Free-form tags such as `format` or `source_asset`.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl BlobMeta {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Metadata of a committed blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub id: BlobId,
    pub filename: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Size of the blob in bytes.
    pub size: u64,
    /// SHA-256 of the stored bytes.
    pub content_hash: ContentHash,
    pub created_at: DateTime<Utc>,
}

impl BlobInfo {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// An open blob write.
///
/// The id is reserved as soon as the sink exists, but the blob only becomes
/// readable once [`BlobSink::commit`] returns. A sink that is aborted, fails, or is
/// dropped before committing leaves nothing behind.
#[async_trait]
pub trait BlobSink: Send {
    /// Id the blob will be readable under after commit.
    fn id(&self) -> BlobId;

    /// Append a chunk of content.
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError>;

    /// Finalize the blob and make it resolvable.
    async fn commit(self: Box<Self>) -> Result<BlobInfo, StorageError>;

    /// Discard everything written so far.
    async fn abort(self: Box<Self>);
}

/// Streaming blob storage keyed by opaque ids.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Allocate a new blob id and open a sink for its content.
    async fn create(&self, meta: BlobMeta) -> Result<BoxSink, StorageError>;

    /// Stream a reader into a new blob and commit it.
    async fn put_stream(
        &self,
        meta: BlobMeta,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<BlobInfo, StorageError> {
        let mut sink = self.create(meta).await?;
        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    sink.abort().await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }
            if let Err(e) = sink.write_chunk(&buf[..n]).await {
                sink.abort().await;
                return Err(e);
            }
        }

        sink.commit().await
    }

    /// Store bytes as a new blob.
    async fn put(&self, meta: BlobMeta, data: &[u8]) -> Result<BlobInfo, StorageError> {
        let mut reader: &[u8] = data;
        self.put_stream(meta, &mut reader).await
    }

    /// Open a committed blob for streaming.
    async fn get_stream(&self, id: &BlobId) -> Result<(BlobInfo, BoxReader), StorageError>;

    /// Retrieve all bytes of a blob.
    async fn get(&self, id: &BlobId) -> Result<Vec<u8>, StorageError> {
        let (_, mut reader) = self.get_stream(id).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Metadata of a committed blob.
    async fn stat(&self, id: &BlobId) -> Result<BlobInfo, StorageError>;

    /// Check whether a blob is resolvable.
    async fn exists(&self, id: &BlobId) -> Result<bool, StorageError> {
        match self.stat(id).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete a blob. Fails with [`StorageError::NotFound`] if it does not exist.
    async fn delete(&self, id: &BlobId) -> Result<(), StorageError>;
}
