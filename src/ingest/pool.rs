//! Ingestion worker pool
//!
//! A fixed number of workers drain a shared submission queue. Each address is
//! claimed at most once per pool lifetime through an in-memory seen set; the
//! claimed address is then downloaded and its record upserted outside the
//! claim lock so slow downloads don't hold up other workers.

use crate::fetch::Downloader;
use crate::record::{upsert_submission, UrlRecord};
use crate::store::RecordStore;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinSet;

/// Handle used to enqueue URLs for ingestion
///
/// The queue closes once every `Submitter` has been dropped, which lets
/// [`IngestionPool::run`] return after draining.
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: mpsc::Sender<String>,
}

impl Submitter {
    /// Enqueues a URL for processing
    ///
    /// Waits only for queue capacity. The outcome of processing is never
    /// reported back; if the pool is gone the URL is logged and dropped.
    pub async fn submit(&self, url: impl Into<String>) {
        let url = url.into();
        if let Err(mpsc::error::SendError(url)) = self.tx.send(url).await {
            tracing::warn!(url = %url, "ingestion pool closed, dropping submission");
        }
    }
}

/// Worker pool that ingests submitted URLs
pub struct IngestionPool {
    workers: usize,
    queue: Arc<TokioMutex<mpsc::Receiver<String>>>,
    store: Arc<dyn RecordStore>,
    downloader: Arc<dyn Downloader>,
    seen: Arc<Mutex<HashSet<String>>>,
}

impl IngestionPool {
    /// Creates a new pool and the handle that feeds it
    ///
    /// # Arguments
    ///
    /// * `workers` - Number of concurrent workers (values below 1 are raised to 1)
    /// * `queue_capacity` - Submissions buffered before `submit` waits
    /// * `store` - Record store the workers upsert into
    /// * `downloader` - Used to fetch each claimed URL
    pub fn new(
        workers: usize,
        queue_capacity: usize,
        store: Arc<dyn RecordStore>,
        downloader: Arc<dyn Downloader>,
    ) -> (Self, Submitter) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));

        let pool = Self {
            workers: workers.max(1),
            queue: Arc::new(TokioMutex::new(rx)),
            store,
            downloader,
            seen: Arc::new(Mutex::new(HashSet::new())),
        };

        (pool, Submitter { tx })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Starts the workers and waits for them to drain the queue
    ///
    /// Returns once the queue is closed and every worker has finished its
    /// current item. Per-item failures are logged and never stop a worker.
    pub async fn run(self) {
        let mut tasks = JoinSet::new();

        for worker_id in 0..self.workers {
            let worker = Worker {
                id: worker_id,
                queue: Arc::clone(&self.queue),
                store: Arc::clone(&self.store),
                downloader: Arc::clone(&self.downloader),
                seen: Arc::clone(&self.seen),
            };
            tasks.spawn(worker.run());
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Ingestion worker terminated abnormally: {}", e);
            }
        }

        tracing::info!("Ingestion pool drained");
    }
}

struct Worker {
    id: usize,
    queue: Arc<TokioMutex<mpsc::Receiver<String>>>,
    store: Arc<dyn RecordStore>,
    downloader: Arc<dyn Downloader>,
    seen: Arc<Mutex<HashSet<String>>>,
}

impl Worker {
    async fn run(self) {
        tracing::info!("starting worker {}", self.id);

        loop {
            let next = self.queue.lock().await.recv().await;
            let Some(url) = next else {
                break;
            };

            if !self.claim(&url) {
                tracing::debug!(url = %url, worker = self.id, "already seen, skipping");
                continue;
            }

            match process_one(&url, self.store.as_ref(), self.downloader.as_ref()).await {
                Ok(record) => tracing::info!(
                    url = %url,
                    worker = self.id,
                    submitted = record.submission_count,
                    "processed URL"
                ),
                Err(e) => tracing::warn!(
                    url = %url,
                    worker = self.id,
                    "unable to process: {}",
                    e
                ),
            }
        }

        tracing::debug!("worker {} stopped", self.id);
    }

    /// Marks `url` as seen, returning false if some worker already claimed it
    fn claim(&self, url: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string())
    }
}

/// Downloads `url` and records the submission in `store`
///
/// Nothing is written when the download fails, so a first sighting that
/// can't be fetched never creates a record.
///
/// # Returns
///
/// * `Ok(UrlRecord)` - The record as stored after this submission
/// * `Err(FetchrankError)` - The download, store access, or record codec failed
pub async fn process_one(
    url: &str,
    store: &dyn RecordStore,
    downloader: &dyn Downloader,
) -> crate::Result<UrlRecord> {
    downloader.download(url).await?;
    tracing::debug!(url, "successfully downloaded");

    Ok(upsert_submission(store, url, Utc::now())?)
}
