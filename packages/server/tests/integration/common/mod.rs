use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::storage::memory::MemoryBlobStore;
use common::storage::{BlobId, BlobInfo, BlobMeta, BlobStore, BoxReader, BoxSink, StorageError};
use common::{AssetStatus, ModelFormat};
use converter::{ConversionEngine, ConversionError, ConvertedModel, ReferenceEngine};
use reqwest::Client;
use reqwest::header::HeaderMap;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, ConversionConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageBackend,
    StorageConfig,
};
use server::conversion::{ConversionPipeline, ConversionQueue, spawn_conversion_workers};
use server::entity::asset;
use server::services::{AssetRegistry, NewAsset};
use server::state::AppState;

pub const MAX_BLOB_SIZE: u64 = 50 * 1024 * 1024;

pub mod routes {
    pub const UPLOAD: &str = "/api/upload";
    pub const ASSETS: &str = "/api/assets";
    pub const ANNOTATIONS: &str = "/api/annotations";

    pub fn asset(id: &str) -> String {
        format!("/api/assets/{id}")
    }

    pub fn file(id: &str) -> String {
        format!("/api/files/{id}")
    }

    pub fn annotations_for(asset_id: &str) -> String {
        format!("/api/annotations/{asset_id}")
    }
}

/// A fresh SQLite database in a temporary directory.
pub struct TestDb {
    pub db: DatabaseConnection,
    pub config: DatabaseConfig,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: format!("sqlite://{}/test.db?mode=rwc", dir.path().display()),
            max_connections: 5,
            min_connections: 1,
        };
        let db = server::database::init_db(&config)
            .await
            .expect("Failed to initialise test database");
        Self {
            db,
            config,
            _dir: dir,
        }
    }
}

/// Engine that completes immediately with the built-in derivative.
pub fn instant_engine() -> Arc<dyn ConversionEngine> {
    Arc::new(ReferenceEngine::new(Duration::ZERO, None))
}

/// Engine that always fails.
pub struct FailingEngine;

#[async_trait]
impl ConversionEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    async fn convert(
        &self,
        _source: Vec<u8>,
        _format: ModelFormat,
    ) -> Result<ConvertedModel, ConversionError> {
        Err(ConversionError::Failed("mesh could not be tessellated".into()))
    }
}

/// Blob store that refuses to write blobs with a given `format` tag and
/// otherwise delegates to an in-memory store.
pub struct RejectingStore {
    pub inner: Arc<MemoryBlobStore>,
    pub reject_format: &'static str,
}

#[async_trait]
impl BlobStore for RejectingStore {
    async fn create(&self, meta: BlobMeta) -> Result<BoxSink, StorageError> {
        if meta.tags.get("format").map(String::as_str) == Some(self.reject_format) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.inner.create(meta).await
    }

    async fn get_stream(&self, id: &BlobId) -> Result<(BlobInfo, BoxReader), StorageError> {
        self.inner.get_stream(id).await
    }

    async fn stat(&self, id: &BlobId) -> Result<BlobInfo, StorageError> {
        self.inner.stat(id).await
    }

    async fn delete(&self, id: &BlobId) -> Result<(), StorageError> {
        self.inner.delete(id).await
    }
}

/// Store `data` and register an asset for it directly, bypassing HTTP.
pub async fn seed_asset(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    filename: &str,
    data: &[u8],
    uploaded_at: DateTime<Utc>,
) -> asset::Model {
    let format = ModelFormat::from_filename(filename).expect("seeded filename must be supported");
    let blob = store
        .put(BlobMeta::new(filename), data)
        .await
        .expect("Failed to store seeded blob");
    let status = AssetStatus::initial_for(format);
    let original = blob.id.as_uuid();

    AssetRegistry::new(db)
        .create(NewAsset {
            title: filename.to_string(),
            original_filename: filename.to_string(),
            format,
            file_size: blob.size as i64,
            original_blob_id: original,
            renderable_blob_id: (status == AssetStatus::Ready).then_some(original),
            status,
            uploaded_at,
        })
        .await
        .expect("Failed to insert seeded asset")
}

pub struct TestOptions {
    pub engine: Arc<dyn ConversionEngine>,
    pub max_blob_size: u64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            engine: instant_engine(),
            max_blob_size: MAX_BLOB_SIZE,
        }
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub store: Arc<MemoryBlobStore>,
    _db: TestDb,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
        }
    }

    pub fn id(&self) -> String {
        self.body["_id"]
            .as_str()
            .expect("response has no _id")
            .to_string()
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let test_db = TestDb::new().await;
        let db = test_db.db.clone();
        let store = Arc::new(MemoryBlobStore::new(options.max_blob_size));

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig::default(),
            },
            database: test_db.config.clone(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                max_blob_size: options.max_blob_size,
                ..Default::default()
            },
            conversion: ConversionConfig::default(),
        };

        let blob_store: Arc<dyn BlobStore> = store.clone();
        let pipeline = Arc::new(ConversionPipeline::new(
            db.clone(),
            Arc::clone(&blob_store),
            options.engine,
        ));
        let (conversions, jobs) = ConversionQueue::bounded(config.conversion.queue_depth);
        spawn_conversion_workers(pipeline, jobs, config.conversion.workers);

        let state = AppState {
            db: db.clone(),
            blob_store,
            conversions,
            config,
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            store,
            _db: test_db,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(name, value)
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    /// GET returning the raw body bytes.
    pub async fn get_bytes(&self, path: &str) -> (u16, HeaderMap, Vec<u8>) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, headers, bytes)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, content_type: &str, body: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", content_type)
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");
        TestResponse::from_response(res).await
    }

    /// Upload `bytes` as the `file` field of a multipart form.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);
        self.send_form(form).await
    }

    pub async fn send_form(&self, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");
        TestResponse::from_response(res).await
    }

    /// Poll the asset until it leaves `processing`, returning its final JSON.
    pub async fn wait_until_settled(&self, asset_id: &str) -> Value {
        for _ in 0..250 {
            let res = self.get(&routes::asset(asset_id)).await;
            assert_eq!(res.status, 200, "asset vanished while waiting: {}", res.text);
            if res.body["status"] != "processing" {
                return res.body;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("asset {asset_id} still processing after 5s");
    }

    pub async fn create_annotation(&self, asset_id: &str, text: &str) -> TestResponse {
        self.post_json(
            routes::ANNOTATIONS,
            &serde_json::json!({
                "assetId": asset_id,
                "text": text,
                "position": {"x": 1.5, "y": -2.0, "z": 0.25},
                "cameraState": {"position": [10.0, 10.0, 10.0], "target": [0.0, 0.0, 0.0]}
            }),
        )
        .await
    }
}
