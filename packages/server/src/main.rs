use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use converter::ReferenceEngine;
use tracing::{Level, info};

use server::config::AppConfig;
use server::conversion::{
    ConversionPipeline, ConversionQueue, requeue_processing, spawn_conversion_workers,
};
use server::database::init_db;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to initialise database")?;
    let blob_store = common::storage::open_store(&config.storage)
        .await
        .context("Failed to open blob store")?;
    info!(backend = ?config.storage.backend, "Blob store ready");

    let engine = Arc::new(ReferenceEngine::from_config(&config.conversion.engine));
    let pipeline = Arc::new(ConversionPipeline::new(
        db.clone(),
        Arc::clone(&blob_store),
        engine,
    ));
    let (conversions, jobs) = ConversionQueue::bounded(config.conversion.queue_depth);
    spawn_conversion_workers(pipeline, jobs, config.conversion.workers);

    if config.conversion.requeue_on_startup {
        let requeued = requeue_processing(&db, &conversions)
            .await
            .context("Failed to requeue pending conversions")?;
        if requeued > 0 {
            info!(requeued, "Resumed interrupted conversions");
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        blob_store,
        conversions,
        config,
    };
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/scalar", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
