//! Fetchrank: a URL ingestion and popularity rescan service
//!
//! This crate accepts submitted URLs, downloads each distinct address once per
//! pool lifetime while counting how often it was submitted, and periodically
//! re-downloads the most submitted addresses in bounded-concurrency batches.

pub mod api;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod record;
pub mod rescan;
pub mod store;

use thiserror::Error;

/// Main error type for Fetchrank operations
#[derive(Debug, Error)]
pub enum FetchrankError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] store::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("Record error: {0}")]
    Record(#[from] record::RecordError),

    #[error("Rescan error: {0}")]
    Rescan(#[from] rescan::RescanError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Fetchrank operations
pub type Result<T> = std::result::Result<T, FetchrankError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use ingest::{process_one, IngestionPool, Submitter};
pub use record::UrlRecord;
pub use rescan::{RescanScheduler, SchedulerState};
pub use store::{RecordStore, SqliteRecordStore};
