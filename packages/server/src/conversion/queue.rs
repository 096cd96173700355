use std::sync::Arc;

use common::ConversionJob;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::pipeline::ConversionPipeline;

#[derive(Debug, Error)]
#[error("conversion queue is closed (asset {})", .0.asset_id)]
pub struct QueueClosed(pub ConversionJob);

/// Sending half of the bounded conversion queue.
///
/// `submit` waits for room when the queue is full, which pushes back on the
/// uploads that produce jobs.
#[derive(Clone)]
pub struct ConversionQueue {
    tx: mpsc::Sender<ConversionJob>,
}

impl ConversionQueue {
    /// Create a queue holding at most `depth` waiting jobs.
    pub fn bounded(depth: usize) -> (Self, mpsc::Receiver<ConversionJob>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (Self { tx }, rx)
    }

    pub async fn submit(&self, job: ConversionJob) -> Result<(), QueueClosed> {
        self.tx.send(job).await.map_err(|e| QueueClosed(e.0))
    }
}

/// Consume `rx`, running at most `workers` conversions at once.
///
/// The dispatcher exits once every [`ConversionQueue`] handle is dropped and the
/// queue is drained.
pub fn spawn_conversion_workers(
    pipeline: Arc<ConversionPipeline>,
    mut rx: mpsc::Receiver<ConversionJob>,
    workers: usize,
) -> JoinHandle<()> {
    let workers = workers.max(1);
    let permits = Arc::new(Semaphore::new(workers));

    tokio::spawn(async move {
        info!(workers, "Conversion workers started");

        while let Some(job) = rx.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                warn!("Worker pool closed, dropping remaining conversion jobs");
                break;
            };
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                pipeline.run(&job).await;
                drop(permit);
            });
        }

        info!("Conversion queue closed, dispatcher exiting");
    })
}
