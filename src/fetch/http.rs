//! HTTP downloader implementation
//!
//! This module handles all outbound HTTP requests, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests that read the full response body
//! - Mapping transport failures and non-2xx statuses to `FetchError`

use crate::config::HttpConfig;
use crate::fetch::{Download, Downloader, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Connect timeout applied regardless of the whole-request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use fetchrank::config::HttpConfig;
/// use fetchrank::fetch::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads URLs with a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a downloader from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Download, FetchError> {
        tracing::debug!(url, "downloading");
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let download = Download {
            status: status.as_u16(),
            bytes: body.len() as u64,
            elapsed: start.elapsed(),
        };

        tracing::debug!(
            url,
            status = download.status,
            bytes = download.bytes,
            "downloaded in {:?}",
            download.elapsed
        );

        Ok(download)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader() -> HttpDownloader {
        HttpDownloader::from_config(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_download_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let download = downloader()
            .download(&format!("{}/page", server.uri()))
            .await
            .unwrap();

        assert_eq!(download.status, 200);
        assert_eq!(download.bytes, 5);
    }

    #[tokio::test]
    async fn test_download_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = downloader()
            .download(&format!("{}/missing", server.uri()))
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_download_connection_refused() {
        // Nothing listens on port 1
        let result = downloader().download("http://127.0.0.1:1/").await;
        assert!(matches!(result, Err(FetchError::Request { .. })));
    }
}
