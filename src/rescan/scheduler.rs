//! Periodic rescan scheduler
//!
//! On every tick the scheduler:
//! 1. Loads every record from the store (a load failure aborts the tick)
//! 2. Decodes them, skipping the ones that fail
//! 3. Ranks them by submission count, highest first, keeping store order on ties
//! 4. Caps the candidate set (more than 10 candidates keeps the top 9)
//! 5. Re-downloads the candidates, at most 3 at a time
//! 6. Waits for every download before reporting the tick
//!
//! The re-downloads only feed the aggregate counters; records are not
//! rewritten and the ingestion pool's seen set is untouched.

use crate::fetch::Downloader;
use crate::record::{decode_all, UrlRecord};
use crate::rescan::state::SchedulerState;
use crate::rescan::stats::{DownloadCounters, TickReport};
use crate::rescan::RescanError;
use crate::store::RecordStore;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex as TokioMutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

/// Candidate count above which the ranked list is truncated
pub const CANDIDATE_THRESHOLD: usize = 10;

/// Number of candidates kept once the threshold is exceeded
pub const TRUNCATED_CANDIDATES: usize = 9;

/// Ceiling on simultaneous re-downloads within a tick
pub const MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// Sorts records by submission count, highest first, and applies the cap
///
/// The sort is stable, so records with equal counts keep their input order.
pub fn rank_candidates(mut records: Vec<UrlRecord>) -> Vec<UrlRecord> {
    records.sort_by(|a, b| b.submission_count.cmp(&a.submission_count));

    if records.len() > CANDIDATE_THRESHOLD {
        records.truncate(TRUNCATED_CANDIDATES);
    }

    records
}

/// Re-downloads the most submitted URLs on a fixed interval
pub struct RescanScheduler {
    interval: Duration,
    store: Arc<dyn RecordStore>,
    downloader: Arc<dyn Downloader>,
    counters: RwLock<DownloadCounters>,
    state: Mutex<SchedulerState>,
    stop_tx: watch::Sender<bool>,
    /// Held for the whole of a tick so ticks never overlap
    tick_lock: TokioMutex<()>,
}

impl RescanScheduler {
    /// Creates an idle scheduler
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between ticks; the first tick fires one interval after `start`
    /// * `store` - Record store the candidates are loaded from
    /// * `downloader` - Used for the re-downloads
    pub fn new(
        interval: Duration,
        store: Arc<dyn RecordStore>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);

        Self {
            // tokio intervals panic on a zero period
            interval: interval.max(Duration::from_millis(1)),
            store,
            downloader,
            counters: RwLock::new(DownloadCounters::default()),
            state: Mutex::new(SchedulerState::Idle),
            stop_tx,
            tick_lock: TokioMutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Snapshot of the aggregate download counters
    pub fn counters(&self) -> DownloadCounters {
        *self.counters.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns the timer loop
    ///
    /// # Returns
    ///
    /// * `Ok(JoinHandle)` - Resolves once the loop has stopped
    /// * `Err(RescanError::AlreadyStarted)` - The scheduler has left the idle state
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<()>, RescanError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != SchedulerState::Idle {
                return Err(RescanError::AlreadyStarted(*state));
            }
            *state = SchedulerState::Running;
        }

        let scheduler = Arc::clone(self);
        Ok(tokio::spawn(async move { scheduler.run_loop().await }))
    }

    /// Asks the loop to exit
    ///
    /// The signal is observed between ticks, so a tick in progress finishes
    /// first. Calling this more than once is harmless.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
        tracing::debug!("Rescan stop requested");
    }

    async fn run_loop(&self) {
        tracing::info!("starting watcher (interval {:?})", self.interval);

        let mut stop_rx = self.stop_tx.subscribe();
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        // At most one pending tick is delivered after a slow cycle
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *stop_rx.borrow_and_update() {
                break;
            }

            tokio::select! {
                biased;
                _ = stop_rx.changed() => continue,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_tick().await {
                        tracing::error!("Rescan tick failed: {}", e);
                    }
                }
            }
        }

        // A manual tick still in flight restores its own state on completion
        let _tick = self.tick_lock.lock().await;
        self.set_state(SchedulerState::Stopped);
        tracing::info!("Stopping watcher...");
    }

    /// Runs a single scan-and-download cycle
    ///
    /// Used by the timer loop on every tick; callable directly as well. The
    /// scheduler returns to the state it was in before the tick.
    ///
    /// # Returns
    ///
    /// * `Ok(TickReport)` - The tick completed; individual download failures are counted, not returned
    /// * `Err(RescanError::Load)` - Records could not be loaded; nothing was downloaded
    /// * `Err(RescanError::Stopped)` - The scheduler has already stopped
    pub async fn run_tick(&self) -> Result<TickReport, RescanError> {
        let _tick = self.tick_lock.lock().await;

        let resume = self.state();
        if resume.is_terminal() {
            return Err(RescanError::Stopped);
        }

        let start = Instant::now();
        self.set_state(SchedulerState::Scanning);

        let values = match self.store.get_all() {
            Ok(values) => values,
            Err(e) => {
                self.set_state(resume);
                return Err(RescanError::Load(e));
            }
        };

        let (records, skipped) = decode_all(&values);
        let loaded = records.len();
        let candidates = rank_candidates(records);
        tracing::debug!(
            "Rescan selected {} of {} records ({} skipped)",
            candidates.len(),
            loaded,
            skipped
        );

        self.set_state(SchedulerState::Downloading);
        let tick = self.download_all(&candidates).await;
        self.set_state(resume);

        let report = TickReport {
            loaded,
            skipped,
            candidates: candidates.into_iter().map(|r| r.address).collect(),
            tick,
            totals: self.counters(),
            elapsed: start.elapsed(),
        };

        tracing::info!("{} (tick took {:?})", report.totals, report.elapsed);

        Ok(report)
    }

    /// Downloads every candidate with at most `MAX_CONCURRENT_DOWNLOADS` in flight
    async fn download_all(&self, candidates: &[UrlRecord]) -> DownloadCounters {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_DOWNLOADS));
        let mut tasks = JoinSet::new();

        for record in candidates {
            // The semaphore is never closed
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let downloader = Arc::clone(&self.downloader);
            let url = record.address.clone();

            tasks.spawn(async move {
                let _permit = permit;
                match downloader.download(&url).await {
                    Ok(download) => {
                        tracing::info!(url = %url, "downloaded in {:?}", download.elapsed);
                        true
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        false
                    }
                }
            });
        }

        let mut tick = DownloadCounters::default();
        while let Some(result) = tasks.join_next().await {
            let success = match result {
                Ok(success) => success,
                Err(e) => {
                    tracing::error!("Rescan download task failed: {}", e);
                    false
                }
            };

            tick.record(success);
            self.counters
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .record(success);
        }

        tick
    }

    fn set_state(&self, next: SchedulerState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            tracing::warn!("Unexpected rescan state transition: {} -> {}", *state, next);
        }
        tracing::trace!("Rescan state {} -> {}", *state, next);
        *state = next;
    }
}
