use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHasher;
use super::id::BlobId;
use super::traits::{BlobInfo, BlobMeta, BlobSink, BlobStore, BoxReader, BoxSink};

/// Filesystem-backed blob store.
///
/// Blobs are stored in a sharded directory layout:
/// `{base_path}/{shard}/{id}` for content and `{base_path}/{shard}/{id}.json`
/// for metadata. Writes go to `{base_path}/.tmp` and are renamed into place on
/// commit; the metadata file is placed before the content, so a resolvable blob
/// always has metadata.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, id: &BlobId) -> PathBuf {
        self.base_path.join(id.shard()).join(id.to_hex())
    }

    fn meta_path(&self, id: &BlobId) -> PathBuf {
        self.base_path
            .join(id.shard())
            .join(format!("{}.json", id.to_hex()))
    }

    fn temp_path(&self, id: &BlobId) -> PathBuf {
        self.base_path.join(".tmp").join(id.to_hex())
    }

    async fn read_info(&self, id: &BlobId) -> Result<BlobInfo, StorageError> {
        let raw = match fs::read(self.meta_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::Metadata(format!(
                    "metadata missing for blob {id}"
                )));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn create(&self, meta: BlobMeta) -> Result<BoxSink, StorageError> {
        let id = BlobId::generate();
        let temp_path = self.temp_path(&id);
        let file = fs::File::create(&temp_path).await?;

        Ok(Box::new(FilesystemSink {
            id,
            meta,
            file: Some(file),
            temp_path,
            blob_path: self.blob_path(&id),
            meta_path: self.meta_path(&id),
            hasher: ContentHasher::new(),
            written: 0,
            max_size: self.max_size,
            committed: false,
        }))
    }

    async fn get_stream(&self, id: &BlobId) -> Result<(BlobInfo, BoxReader), StorageError> {
        let file = match fs::File::open(self.blob_path(id)).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };
        let info = self.read_info(id).await?;
        Ok((info, Box::new(BufReader::new(file))))
    }

    async fn stat(&self, id: &BlobId) -> Result<BlobInfo, StorageError> {
        if !fs::try_exists(self.blob_path(id)).await? {
            return Err(StorageError::NotFound(id.to_hex()));
        }
        self.read_info(id).await
    }

    async fn delete(&self, id: &BlobId) -> Result<(), StorageError> {
        match fs::remove_file(self.blob_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_hex()));
            }
            Err(e) => return Err(e.into()),
        }

        match fs::remove_file(self.meta_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

struct FilesystemSink {
    id: BlobId,
    meta: BlobMeta,
    /// `None` once the write has been closed or has failed.
    file: Option<fs::File>,
    temp_path: PathBuf,
    blob_path: PathBuf,
    meta_path: PathBuf,
    hasher: ContentHasher,
    written: u64,
    max_size: u64,
    committed: bool,
}

impl FilesystemSink {
    async fn discard(&mut self) {
        self.file = None;
        let _ = fs::remove_file(&self.temp_path).await;
    }

    async fn finish(&mut self) -> Result<BlobInfo, StorageError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| StorageError::Io(std::io::Error::other("blob write already closed")))?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let info = BlobInfo {
            id: self.id,
            filename: std::mem::take(&mut self.meta.filename),
            tags: std::mem::take(&mut self.meta.tags),
            size: self.written,
            content_hash: std::mem::take(&mut self.hasher).finalize(),
            created_at: Utc::now(),
        };

        if let Some(parent) = self.blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let meta_temp = self.temp_path.with_extension("json");
        fs::write(&meta_temp, serde_json::to_vec(&info)?).await?;
        if let Err(e) = fs::rename(&meta_temp, &self.meta_path).await {
            let _ = fs::remove_file(&meta_temp).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&self.temp_path, &self.blob_path).await {
            let _ = fs::remove_file(&self.meta_path).await;
            return Err(e.into());
        }

        Ok(info)
    }
}

#[async_trait]
impl BlobSink for FilesystemSink {
    fn id(&self) -> BlobId {
        self.id
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let total = self.written + chunk.len() as u64;
        if total > self.max_size {
            self.discard().await;
            return Err(StorageError::SizeLimitExceeded {
                actual: total,
                limit: self.max_size,
            });
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StorageError::Io(std::io::Error::other("blob write already closed")))?;
        if let Err(e) = file.write_all(chunk).await {
            self.discard().await;
            return Err(e.into());
        }

        self.hasher.update(chunk);
        self.written = total;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<BlobInfo, StorageError> {
        let mut this = self;
        match this.finish().await {
            Ok(info) => {
                this.committed = true;
                debug!(blob_id = %info.id, size = info.size, "Committed blob");
                Ok(info)
            }
            Err(e) => {
                this.discard().await;
                Err(e)
            }
        }
    }

    async fn abort(self: Box<Self>) {
        let mut this = self;
        this.discard().await;
    }
}

impl Drop for FilesystemSink {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}
