//! Fetch module for downloading submitted URLs
//!
//! The ingestion pool and the rescan scheduler only see the `Downloader`
//! trait; `HttpDownloader` is the production implementation.

mod http;

pub use http::{build_http_client, HttpDownloader};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while downloading a URL
///
/// Transport errors and non-2xx responses are both failures; callers do not
/// treat them differently.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("error downloading {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("error downloading {url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. } | Self::Status { url, .. } => url,
        }
    }
}

/// Summary of a completed download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download {
    /// HTTP status code
    pub status: u16,
    /// Length of the response body
    pub bytes: u64,
    /// Time from request start to end of body
    pub elapsed: Duration,
}

/// Fetches a URL
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Download, FetchError>;
}
