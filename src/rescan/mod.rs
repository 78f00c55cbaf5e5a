//! Rescan module
//!
//! Periodically ranks every known URL by submission count and re-downloads
//! the most popular ones with bounded parallelism, keeping aggregate
//! success/failure counters.

mod scheduler;
mod state;
mod stats;

pub use scheduler::{
    rank_candidates, RescanScheduler, CANDIDATE_THRESHOLD, MAX_CONCURRENT_DOWNLOADS,
    TRUNCATED_CANDIDATES,
};
pub use state::SchedulerState;
pub use stats::{DownloadCounters, TickReport};

use crate::store::StorageError;
use thiserror::Error;

/// Errors reported by the rescan scheduler
#[derive(Debug, Error)]
pub enum RescanError {
    #[error("unable to load records: {0}")]
    Load(#[source] StorageError),

    #[error("scheduler already started (state: {0})")]
    AlreadyStarted(SchedulerState),

    #[error("scheduler has stopped")]
    Stopped,
}
